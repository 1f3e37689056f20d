/// Generates the `match` that routes each [`Command`](crate::command::Command)
/// variant to the `run` method of the handler type of the same name.
///
/// # Parameters
/// - `$command:expr`: the parsed command enum value.
/// - `$ctx:expr`: the invocation [`Context`](crate::command::Context).
/// - `$stores:expr`: read-only access to the stores.
/// - `$($handler:ident),*`: handler types; each must be both a variant name and
///   a type implementing `CommandHandler`.
///
/// # Example
/// ```ignore
/// dispatch_commands!(command, &ctx, &stores, SnippetSave, GoalList)
/// ```
/// expands to:
/// ```ignore
/// match command {
///     Command::SnippetSave(args) => SnippetSave::run(args, &ctx, &stores),
///     Command::GoalList(args) => GoalList::run(args, &ctx, &stores),
/// }
/// ```
///
/// A variant missing from the list is a compile error (non-exhaustive match),
/// so no command can be parsed without a handler behind it.
#[macro_export]
macro_rules! dispatch_commands {
    ($command:expr, $ctx:expr, $stores:expr, $($handler:ident),* $(,)?) => {
        match $command {
            $(
                Command::$handler(args) => $handler::run(args, $ctx, $stores),
            )*
        }
    };
}
