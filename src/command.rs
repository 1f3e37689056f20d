//! Typed interface for every bot command.
//!
//! An [`Interaction`] is what the chat platform forwards when a member runs a
//! slash command. The command name travels in the `"command"` key next to the
//! caller and the command's own arguments:
//!
//! ```json
//! {"user": {"id": "81", "name": "ada"}, "command": "snippet.get", "name": "fizzbuzz"}
//! {"user": {"id": "81", "name": "ada"}, "command": "timer", "minutes": 25,
//!  "replyTo": {"kind": "interaction", "token": "abc"}}
//! ```
//!
//! Handlers never touch the stores directly. They read a borrowed [`Stores`]
//! and describe their writes as [`Mutation`]s, which the dispatcher applies
//! and persists after the handler returns.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::commands::{
    challenge::{ChallengeComplete, ChallengeDraw, ChallengeStats, ChallengesCompleted},
    docs::DocsLookup,
    format::FormatCode,
    github::{RepoList, RepoTrack},
    goal::{GoalComplete, GoalList, GoalSet},
    interview::InterviewQuestion,
    learn::LearnTopic,
    progress::{ProgressLogSession, ProgressStats, ProgressWeek},
    review::{ReviewClose, ReviewList, ReviewRespond, ReviewSubmit},
    snippet::{SnippetGet, SnippetList, SnippetSave, SnippetSearch},
    timer::TimerStart,
    welcome::MemberJoin,
};
use crate::error::ServiceResult;
use crate::reply::{Embed, Reply};
use crate::storage::{StoreName, Stores};
use crate::types::{ChallengeAssignment, Goal, ProgressLog, Review, Snippet, TrackedRepo};

/// Platform identity of whoever ran the command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Caller {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Where a delayed message for this interaction should be delivered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Destination {
    /// Follow-up on the original interaction (expires on the platform side).
    Interaction { token: String },
    Channel { id: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user: Caller,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Destination>,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "command")]
pub enum Command {
    #[serde(rename = "snippet.save")]
    SnippetSave(SnippetSave),
    #[serde(rename = "snippet.get")]
    SnippetGet(SnippetGet),
    #[serde(rename = "snippet.list")]
    SnippetList(SnippetList),
    #[serde(rename = "snippet.search")]
    SnippetSearch(SnippetSearch),

    #[serde(rename = "goal.set")]
    GoalSet(GoalSet),
    #[serde(rename = "goal.complete")]
    GoalComplete(GoalComplete),
    #[serde(rename = "goal.list")]
    GoalList(GoalList),

    #[serde(rename = "challenge")]
    ChallengeDraw(ChallengeDraw),
    #[serde(rename = "challenge-complete")]
    ChallengeComplete(ChallengeComplete),
    #[serde(rename = "my-challenges.completed")]
    ChallengesCompleted(ChallengesCompleted),
    #[serde(rename = "my-challenges.stats")]
    ChallengeStats(ChallengeStats),

    #[serde(rename = "docs")]
    DocsLookup(DocsLookup),
    #[serde(rename = "timer")]
    TimerStart(TimerStart),

    #[serde(rename = "progress.log")]
    ProgressLogSession(ProgressLogSession),
    #[serde(rename = "progress.stats")]
    ProgressStats(ProgressStats),
    #[serde(rename = "progress.week")]
    ProgressWeek(ProgressWeek),

    #[serde(rename = "github.track")]
    RepoTrack(RepoTrack),
    #[serde(rename = "github.list")]
    RepoList(RepoList),

    #[serde(rename = "review.submit")]
    ReviewSubmit(ReviewSubmit),
    #[serde(rename = "review.list")]
    ReviewList(ReviewList),
    #[serde(rename = "review.feedback")]
    ReviewRespond(ReviewRespond),
    #[serde(rename = "review.close")]
    ReviewClose(ReviewClose),

    #[serde(rename = "learn")]
    LearnTopic(LearnTopic),
    #[serde(rename = "interview.question")]
    InterviewQuestion(InterviewQuestion),
    #[serde(rename = "format")]
    FormatCode(FormatCode),

    /// Platform event: `user` has just joined a guild.
    #[serde(rename = "member-join")]
    MemberJoin(MemberJoin),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SnippetSave(_) => "snippet.save",
            Command::SnippetGet(_) => "snippet.get",
            Command::SnippetList(_) => "snippet.list",
            Command::SnippetSearch(_) => "snippet.search",
            Command::GoalSet(_) => "goal.set",
            Command::GoalComplete(_) => "goal.complete",
            Command::GoalList(_) => "goal.list",
            Command::ChallengeDraw(_) => "challenge",
            Command::ChallengeComplete(_) => "challenge-complete",
            Command::ChallengesCompleted(_) => "my-challenges.completed",
            Command::ChallengeStats(_) => "my-challenges.stats",
            Command::DocsLookup(_) => "docs",
            Command::TimerStart(_) => "timer",
            Command::ProgressLogSession(_) => "progress.log",
            Command::ProgressStats(_) => "progress.stats",
            Command::ProgressWeek(_) => "progress.week",
            Command::RepoTrack(_) => "github.track",
            Command::RepoList(_) => "github.list",
            Command::ReviewSubmit(_) => "review.submit",
            Command::ReviewList(_) => "review.list",
            Command::ReviewRespond(_) => "review.feedback",
            Command::ReviewClose(_) => "review.close",
            Command::LearnTopic(_) => "learn",
            Command::InterviewQuestion(_) => "interview.question",
            Command::FormatCode(_) => "format",
            Command::MemberJoin(_) => "member-join",
        }
    }
}

/// Per-invocation inputs that are not command arguments.
#[derive(Clone, Debug)]
pub struct Context {
    pub caller: Caller,
    pub now: DateTime<Utc>,
    /// Random draw for commands that pick from a catalog.
    pub roll: u64,
}

impl Context {
    pub fn new(caller: Caller, now: DateTime<Utc>, roll: u64) -> Self {
        Self { caller, now, roll }
    }

    pub fn owner(&self) -> &str {
        &self.caller.id
    }

    /// Index into a catalog of `len` entries (`len` must be non-zero).
    pub fn pick(&self, len: usize) -> usize {
        (self.roll % len as u64) as usize
    }
}

/// A single write a handler wants applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Snippet(String, Snippet),
    Goal(String, Goal),
    Challenge(String, ChallengeAssignment),
    Review(String, Review),
    Repo(String, TrackedRepo),
    Progress(String, ProgressLog),
}

impl Mutation {
    pub fn store(&self) -> StoreName {
        match self {
            Mutation::Snippet(..) => StoreName::Snippets,
            Mutation::Goal(..) => StoreName::Goals,
            Mutation::Challenge(..) => StoreName::Challenges,
            Mutation::Review(..) => StoreName::Reviews,
            Mutation::Repo(..) => StoreName::Repos,
            Mutation::Progress(..) => StoreName::Progress,
        }
    }

    /// Applies the write and returns the store it touched.
    pub fn apply(self, stores: &mut Stores) -> StoreName {
        let name = self.store();
        match self {
            Mutation::Snippet(key, record) => stores.snippets.set(key, record),
            Mutation::Goal(key, record) => stores.goals.set(key, record),
            Mutation::Challenge(key, record) => stores.challenges.set(key, record),
            Mutation::Review(key, record) => stores.reviews.set(key, record),
            Mutation::Repo(key, record) => stores.repos.set(key, record),
            Mutation::Progress(key, record) => stores.progress.set(key, record),
        }
        name
    }
}

/// Message delivered once `after` has elapsed.
#[derive(Clone, Debug, PartialEq)]
pub struct FollowUp {
    pub after: Duration,
    pub embed: Embed,
}

/// Message for the channel called `channel_name` in one guild.
#[derive(Clone, Debug, PartialEq)]
pub struct Announcement {
    pub guild_id: String,
    pub channel_name: String,
    pub embed: Embed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub reply: Reply,
    pub mutations: Vec<Mutation>,
    pub follow_ups: Vec<FollowUp>,
    pub announcements: Vec<Announcement>,
}

impl Outcome {
    /// Reply without any state change.
    pub fn reply(reply: Reply) -> Self {
        Self {
            reply,
            mutations: Vec::new(),
            follow_ups: Vec::new(),
            announcements: Vec::new(),
        }
    }

    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    pub fn with_follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_ups.push(follow_up);
        self
    }

    pub fn with_announcement(mut self, announcement: Announcement) -> Self {
        self.announcements.push(announcement);
        self
    }
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Outcome::reply(reply)
    }
}

pub trait CommandHandler {
    fn run(self, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome>;
}

/// Runs the handler registered for `command`. The match is exhaustive, so
/// every parsed command has exactly one handler.
pub fn execute(command: Command, ctx: &Context, stores: &Stores) -> ServiceResult<Outcome> {
    dispatch_commands!(
        command,
        ctx,
        stores,
        SnippetSave,
        SnippetGet,
        SnippetList,
        SnippetSearch,
        GoalSet,
        GoalComplete,
        GoalList,
        ChallengeDraw,
        ChallengeComplete,
        ChallengesCompleted,
        ChallengeStats,
        DocsLookup,
        TimerStart,
        ProgressLogSession,
        ProgressStats,
        ProgressWeek,
        RepoTrack,
        RepoList,
        ReviewSubmit,
        ReviewList,
        ReviewRespond,
        ReviewClose,
        LearnTopic,
        InterviewQuestion,
        FormatCode,
        MemberJoin,
    )
}
