use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{CommandHandler, Context, Mutation, Outcome};
use crate::error::ServiceResult;
use crate::key::derive_key;
use crate::reply::{Embed, Reply, colors};
use crate::storage::Stores;
use crate::types::Goal;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GoalSet {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free text, usually `YYYY-MM-DD`.
    #[serde(default)]
    pub deadline: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GoalComplete {
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GoalList {}

impl CommandHandler for GoalSet {
    fn run(self, ctx: &Context, _stores: &Stores) -> ServiceResult<Outcome> {
        let embed = Embed::new(colors::GOAL, "🎯 Learning Goal Set!")
            .field("Goal", self.title.as_str())
            .field(
                "Description",
                self.description
                    .as_deref()
                    .unwrap_or("No description provided"),
            )
            .field(
                "Deadline",
                self.deadline.as_deref().unwrap_or("No deadline set"),
            );

        let goal = Goal {
            title: self.title,
            description: self.description,
            deadline: self.deadline,
            completed: false,
            completed_at: None,
            owner_id: ctx.owner().to_string(),
            created_at: ctx.now,
        };
        let key = derive_key(ctx.owner(), &goal.title);
        Ok(Outcome::reply(Reply::embed(embed)).with_mutation(Mutation::Goal(key, goal)))
    }
}

impl CommandHandler for GoalComplete {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let key = derive_key(ctx.owner(), &self.title);
        let Some(goal) = stores.goals.get(&key) else {
            return Ok(Reply::notice(format!("❌ Goal \"{}\" not found!", self.title)).into());
        };
        if goal.completed {
            return Ok(Reply::notice(format!(
                "✅ You already completed \"{}\"!",
                goal.title
            ))
            .into());
        }

        let mut goal = goal.clone();
        goal.completed = true;
        goal.completed_at = Some(ctx.now);

        let embed = Embed::new(colors::SUCCESS, "🎉 Goal Completed!")
            .description(format!("Congratulations on completing: **{}**", goal.title));
        Ok(Outcome::reply(Reply::embed(embed)).with_mutation(Mutation::Goal(key, goal)))
    }
}

impl CommandHandler for GoalList {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
        let (completed, active): (Vec<&Goal>, Vec<&Goal>) = stores
            .goals
            .owned_by(ctx.owner())
            .map(|(_, g)| g)
            .partition(|g| g.completed);

        if completed.is_empty() && active.is_empty() {
            return Ok(Reply::notice("🎯 You have no learning goals set yet!").into());
        }

        let mut embed = Embed::new(colors::INFO, "🎯 Your Learning Goals");
        if !active.is_empty() {
            let lines: Vec<String> = active
                .iter()
                .map(|g| match &g.deadline {
                    Some(deadline) => format!("**{}** (Due: {deadline})", g.title),
                    None => format!("**{}**", g.title),
                })
                .collect();
            embed = embed.field("🔄 Active Goals", lines.join("\n"));
        }
        if !completed.is_empty() {
            let lines: Vec<String> = completed
                .iter()
                .map(|g| format!("**{}**", g.title))
                .collect();
            embed = embed.field("✅ Completed Goals", lines.join("\n"));
        }
        Ok(Reply::embed(embed).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{apply, ctx, ctx_at};
    use chrono::Duration;

    fn set(stores: &mut Stores, owner: &str, title: &str, deadline: Option<&str>) {
        let args = GoalSet {
            title: title.into(),
            description: None,
            deadline: deadline.map(str::to_string),
        };
        let outcome = args.run(&ctx(owner), stores).unwrap();
        apply(stores, outcome);
    }

    #[test]
    fn completed_goal_moves_from_active_to_completed() {
        let mut stores = Stores::default();
        set(&mut stores, "U1", "Learn Go", None);

        let listed = GoalList {}.run(&ctx("U1"), &stores).unwrap();
        let embed = listed.reply.first_embed().unwrap();
        assert_eq!(embed.field_value("🔄 Active Goals"), Some("**Learn Go**"));
        assert_eq!(embed.field_value("✅ Completed Goals"), None);

        let done = GoalComplete { title: "Learn Go".into() }
            .run(&ctx("U1"), &stores)
            .unwrap();
        apply(&mut stores, done);

        let listed = GoalList {}.run(&ctx("U1"), &stores).unwrap();
        let embed = listed.reply.first_embed().unwrap();
        assert_eq!(embed.field_value("🔄 Active Goals"), None);
        assert_eq!(embed.field_value("✅ Completed Goals"), Some("**Learn Go**"));
    }

    #[test]
    fn completing_twice_reports_already_done_without_mutation() {
        let mut stores = Stores::default();
        set(&mut stores, "U1", "Learn Go", None);

        let first = GoalComplete { title: "Learn Go".into() }
            .run(&ctx("U1"), &stores)
            .unwrap();
        apply(&mut stores, first);
        let after_first = stores.clone();

        let later = ctx_at("U1", ctx("U1").now + Duration::hours(5));
        let second = GoalComplete { title: "Learn Go".into() }.run(&later, &stores).unwrap();
        assert!(second.mutations.is_empty());
        assert_eq!(second.reply, Reply::notice("✅ You already completed \"Learn Go\"!"));
        apply(&mut stores, second);
        assert_eq!(stores, after_first);
    }

    #[test]
    fn unknown_goal_is_not_found() {
        let stores = Stores::default();
        let outcome = GoalComplete { title: "Nope".into() }
            .run(&ctx("U1"), &stores)
            .unwrap();
        assert_eq!(outcome.reply, Reply::notice("❌ Goal \"Nope\" not found!"));
    }

    #[test]
    fn deadlines_show_in_active_list() {
        let mut stores = Stores::default();
        set(&mut stores, "U1", "Ship bot", Some("2025-01-31"));
        set(&mut stores, "U2", "Hidden", None);
        let listed = GoalList {}.run(&ctx("U1"), &stores).unwrap();
        assert_eq!(
            listed.reply.first_embed().unwrap().field_value("🔄 Active Goals"),
            Some("**Ship bot** (Due: 2025-01-31)")
        );
        let empty = GoalList {}.run(&ctx("U3"), &stores).unwrap();
        assert_eq!(empty.reply, Reply::notice("🎯 You have no learning goals set yet!"));
    }
}
