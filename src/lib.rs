/*!
cmdroute - declarative command routing.

Commands are described as data (`CommandDefinition` built with
`CommandDefinition::builder` or loaded from a `config::CommandFile`) and
registered on a `CommandManager`. The manager routes a label plus tokens to
the overloads at the deepest matching path, resolves each candidate's
parameters through the type resolver registry, invokes the first one that
binds, and reports the closest failure otherwise. The same metadata drives
tab completion and help.

```no_run
use cmdroute::{CommandDefinition, CommandManager, ParameterDefinition};

let manager = CommandManager::new();
manager
    .register_command(
        CommandDefinition::builder("team")
            .subcommand("invite|inv")
            .parameter(ParameterDefinition::new("player", "string"))
            .handler(|issuer, args| {
                let player = args.get::<String>("player").cloned().unwrap_or_default();
                issuer.send_message(&format!("invited {player}"));
                Ok(())
            })
            .build()?,
    )?;
# Ok::<(), cmdroute::RegistrationError>(())
```
*/

pub mod completion;
pub mod config;
pub mod definition;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod help;
pub mod issuer;
pub mod locales;
pub mod manager;
pub mod registry;
pub mod resolution;
pub mod tree;
pub mod value;

pub use config::{CommandFile, CommandSpec, ConfigError, HandlerTable, ManagerSettings, ParameterSpec};
pub use definition::{
    CommandBuilder, CommandDefinition, Constraint, DefaultValue, Handler, ParameterDefinition, ResolverOptions,
    Segment, Signature, TypeKey,
};
pub use dispatcher::Outcome;
pub use error::{CommandError, RegistrationError, ResolveError};
pub use format::{AnsiFormatter, MessageFormatter, MessageType, PlainFormatter, StyleOptions};
pub use help::{CommandHelp, HelpEntry};
pub use issuer::CommandIssuer;
pub use locales::{Locale, Locales, keys};
pub use manager::CommandManager;
pub use registry::{CompletionContext, ConditionContext, Registries, ResolveContext};
pub use resolution::{ConditionFailure, FailureReason, Rejected, Rejection, ResolutionContext, ResolutionFailure};
pub use tree::{Candidate, CommandTree, RootCommand};
pub use value::{Arguments, BoundValue, Value};
