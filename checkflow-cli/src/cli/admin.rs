use super::context::ActorArgs;
use checkflow_core::models::{Role, UnitId, UnitType, UserId};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Create the first super admin of an empty store
    Bootstrap {
        /// Employee id of the super admin
        employee_id: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Initial credential
        #[arg(long, env = "CHECKFLOW_BOOTSTRAP_CREDENTIAL", hide_env_values = true)]
        credential: String,
    },

    /// Create a user account
    UserCreate {
        /// Employee id (letters, digits, '-' and '_')
        employee_id: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Job title
        #[arg(long, default_value = "")]
        designation: String,

        /// Roles, comma separated (MAKER, CHECKER, ADMIN, SUPER_ADMIN)
        #[arg(long = "role", value_delimiter = ',')]
        roles: Vec<Role>,

        /// Unit the user belongs to
        #[arg(long)]
        unit: Option<UnitId>,

        /// Initial credential
        #[arg(long = "new-credential")]
        new_credential: Option<String>,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List user accounts
    UserList {
        /// Only users of this unit
        #[arg(long)]
        unit: Option<UnitId>,

        /// Only active (true) or inactive (false) users
        #[arg(long)]
        active: Option<bool>,

        /// Match on name or employee id
        #[arg(long)]
        search: Option<String>,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show a user account
    UserShow {
        id: UserId,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Change profile fields of a user
    UserUpdate {
        id: UserId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(long)]
        designation: Option<String>,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Replace the roles of a user
    AssignRoles {
        id: UserId,

        /// Roles, comma separated
        #[arg(long = "role", value_delimiter = ',', required = true)]
        roles: Vec<Role>,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Move a user to another unit
    AssignUnit {
        id: UserId,

        /// Target unit
        #[arg(long, conflicts_with = "none", required_unless_present = "none")]
        unit: Option<UnitId>,

        /// Detach the user from every unit (super admins only)
        #[arg(long)]
        none: bool,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Deactivate a user account
    Deactivate {
        id: UserId,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Reactivate a user account
    Reactivate {
        id: UserId,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Set a new credential for a user
    ResetCredential {
        id: UserId,

        #[arg(long = "new-credential")]
        new_credential: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Create an organizational unit
    UnitCreate {
        /// Unique short code, e.g. BR-012
        code: String,

        #[arg(short, long)]
        name: String,

        /// HEAD_OFFICE, ZONE, REGION, BRANCH or OTHER
        #[arg(long = "type", default_value = "OTHER")]
        unit_type: UnitType,

        /// Parent unit
        #[arg(long)]
        parent: Option<UnitId>,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List organizational units
    UnitList {
        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Rename a unit
    UnitRename {
        id: UnitId,

        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Re-parent a unit that nothing refers to yet
    UnitMove {
        id: UnitId,

        /// New parent unit
        #[arg(long, conflicts_with = "root", required_unless_present = "root")]
        parent: Option<UnitId>,

        /// Make the unit a root
        #[arg(long)]
        root: bool,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the available roles
    Roles {
        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}
