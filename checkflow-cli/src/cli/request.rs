use super::context::ActorArgs;
use checkflow_core::models::{RequestId, RequestStatus, RequestType};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum RequestCommands {
    /// Submit a new request for review
    Create {
        /// Request type (CREATE_USER, UPDATE_USER, DELETE_USER, ASSIGN_ROLE, CHANGE_UNIT, DEACTIVATE_USER)
        #[arg(long = "type")]
        request_type: RequestType,

        /// Short summary
        #[arg(short, long)]
        title: String,

        /// Detailed description
        #[arg(short, long)]
        description: String,

        /// JSON object handed to the downstream executor
        #[arg(long)]
        payload: Option<String>,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show a request with its audit trail
    Show {
        /// Request ID
        id: RequestId,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List your own requests, newest first
    Mine {
        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List pending requests you may act on, oldest first
    Queue {
        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List every request (admins)
    All {
        /// Filter by status
        #[arg(long)]
        status: Option<RequestStatus>,

        /// Filter by request type
        #[arg(long = "type")]
        request_type: Option<RequestType>,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Approve a pending request
    Approve {
        /// Request ID
        id: RequestId,

        /// Justification recorded in the audit trail
        #[arg(short, long)]
        remarks: String,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Reject a pending request
    Reject {
        /// Request ID
        id: RequestId,

        /// Justification recorded in the audit trail
        #[arg(short, long)]
        remarks: String,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Raise a follow-up to one of your rejected requests
    Resubmit {
        /// ID of the rejected request
        id: RequestId,

        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        /// JSON object handed to the downstream executor
        #[arg(long)]
        payload: Option<String>,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show request statistics
    Stats {
        /// Only counters about yourself
        #[arg(long)]
        mine: bool,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List reviewers who could act on a request right now (admins)
    Checkers {
        /// Request ID
        id: RequestId,

        #[command(flatten)]
        actor: ActorArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}
