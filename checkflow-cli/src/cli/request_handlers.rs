//! Request command handlers

use super::context::print_json;
use super::request::RequestCommands;
use anyhow::{Context, Result};
use checkflow_core::models::{ApprovalRequest, RequestFilter, UserSummary};
use checkflow_core::workflow::{RequestDetail, RequestDraft, ResubmitDraft};
use checkflow_core::Checkflow;
use chrono::{DateTime, Local, Utc};
use serde_json::Value;

fn local_time(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Parse an optional `--payload` argument
pub fn parse_payload(payload: Option<&str>) -> Result<Value> {
    match payload {
        Some(text) => serde_json::from_str(text).context("--payload must be valid JSON"),
        None => Ok(Value::Null),
    }
}

fn print_request_line(request: &ApprovalRequest) {
    println!(
        "  #{:<5} [{}] {} - {} (maker {}, {})",
        request.id,
        request.status,
        request.request_type,
        request.title,
        request.creator,
        local_time(&request.created_at)
    );
}

fn print_request_list(heading: &str, requests: &[ApprovalRequest]) {
    println!("{} ({}):", heading, requests.len());
    if requests.is_empty() {
        println!("  (none)");
    }
    for request in requests {
        print_request_line(request);
    }
}

fn print_request(request: &ApprovalRequest) {
    println!("Request #{}", request.id);
    println!("  Type:        {}", request.request_type);
    println!("  Title:       {}", request.title);
    println!("  Description: {}", request.description);
    println!("  Status:      {}", request.status);
    println!("  Maker:       {} (unit {})", request.creator, request.maker_unit);
    if let Some(checker) = request.assigned_checker {
        println!("  Checker:     {}", checker);
    }
    if let Some(reviewer) = request.reviewer {
        println!("  Reviewer:    {}", reviewer);
    }
    if let Some(reviewed_at) = request.reviewed_at {
        println!("  Reviewed:    {}", local_time(&reviewed_at));
    }
    if let Some(remarks) = &request.remarks {
        println!("  Remarks:     {}", remarks);
    }
    if let Some(original) = request.resubmission_of {
        println!("  Follows up:  #{}", original);
    }
    println!(
        "  Created:     {}",
        local_time(&request.created_at)
    );
}

fn print_detail(detail: &RequestDetail) -> Result<()> {
    print_request(&detail.request);
    println!(
        "  Payload:     {}",
        serde_json::to_string(&detail.request.payload)?
    );
    println!();
    println!("Audit trail:");
    for entry in &detail.trail {
        let actor = entry
            .actor
            .map(|a| a.to_string())
            .unwrap_or_else(|| "system".to_string());
        println!(
            "  {} {:<9} by {}{}",
            local_time(&entry.timestamp),
            entry.action.as_str(),
            actor,
            entry
                .remarks
                .as_deref()
                .map(|r| format!(": {}", r))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn print_users(users: &[UserSummary]) {
    for user in users {
        let roles: Vec<_> = user.roles.iter().map(|r| r.as_str()).collect();
        println!(
            "  {:<5} {:<12} {} [{}]",
            user.id,
            user.employee_id,
            user.display_name,
            roles.join(",")
        );
    }
}

pub fn handle_request_command(app: &Checkflow, command: RequestCommands) -> Result<()> {
    match command {
        RequestCommands::Create {
            request_type,
            title,
            description,
            payload,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let draft = RequestDraft {
                request_type,
                title,
                description,
                payload: parse_payload(payload.as_deref())?,
            };
            let request = app.engine.create(&actor, draft)?;
            if json {
                print_json(&request)?;
            } else {
                println!("✅ Request #{} submitted", request.id);
                match request.assigned_checker {
                    Some(checker) => println!("   Assigned to checker {}", checker),
                    None => println!("   Waiting in the queue of every eligible checker"),
                }
            }
        }
        RequestCommands::Show { id, actor, json } => {
            let actor = actor.login(app)?;
            let detail = app.engine.get_request(&actor, id)?;
            if json {
                print_json(&detail)?;
            } else {
                print_detail(&detail)?;
            }
        }
        RequestCommands::Mine { actor, json } => {
            let actor = actor.login(app)?;
            let requests = app.engine.my_requests(&actor)?;
            if json {
                print_json(&requests)?;
            } else {
                print_request_list("My requests", &requests);
            }
        }
        RequestCommands::Queue { actor, json } => {
            let actor = actor.login(app)?;
            let requests = app.engine.pending_queue(&actor)?;
            if json {
                print_json(&requests)?;
            } else {
                print_request_list("Pending queue", &requests);
            }
        }
        RequestCommands::All {
            status,
            request_type,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let filter = RequestFilter {
                status,
                request_type,
            };
            let requests = app.engine.all_requests(&actor, &filter)?;
            if json {
                print_json(&requests)?;
            } else {
                print_request_list("All requests", &requests);
            }
        }
        RequestCommands::Approve {
            id,
            remarks,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let request = app.engine.approve(&actor, id, &remarks)?;
            if json {
                print_json(&request)?;
            } else {
                println!("✅ Request #{} approved", request.id);
            }
        }
        RequestCommands::Reject {
            id,
            remarks,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let request = app.engine.reject(&actor, id, &remarks)?;
            if json {
                print_json(&request)?;
            } else {
                println!("❌ Request #{} rejected", request.id);
            }
        }
        RequestCommands::Resubmit {
            id,
            title,
            description,
            payload,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let draft = ResubmitDraft {
                title,
                description,
                payload: parse_payload(payload.as_deref())?,
            };
            let request = app.engine.resubmit(&actor, id, draft)?;
            if json {
                print_json(&request)?;
            } else {
                println!("🔁 Request #{} resubmitted as #{}", id, request.id);
            }
        }
        RequestCommands::Stats { mine, actor, json } => {
            let actor = actor.login(app)?;
            if mine {
                let stats = app.engine.actor_statistics(&actor)?;
                if json {
                    print_json(&stats)?;
                } else {
                    println!("My statistics");
                    println!("  Created:         {}", stats.created);
                    println!("  Pending for me:  {}", stats.pending_for_me);
                    println!("  Approved by me:  {}", stats.approved_by_me);
                    println!("  Rejected by me:  {}", stats.rejected_by_me);
                }
            } else {
                let stats = app.engine.statistics(&actor)?;
                if json {
                    print_json(&serde_json::json!({
                        "total": stats.total,
                        "pending": stats.pending,
                        "approved": stats.approved,
                        "rejected": stats.rejected,
                        "pending_rate": stats.pending_rate(),
                        "approval_rate": stats.approval_rate(),
                        "rejection_rate": stats.rejection_rate(),
                    }))?;
                } else {
                    println!("Request statistics");
                    println!("  Total:     {}", stats.total);
                    println!("  Pending:   {} ({}%)", stats.pending, stats.pending_rate());
                    println!("  Approved:  {} ({}%)", stats.approved, stats.approval_rate());
                    println!("  Rejected:  {} ({}%)", stats.rejected, stats.rejection_rate());
                }
            }
        }
        RequestCommands::Checkers { id, actor, json } => {
            let actor = actor.login(app)?;
            let checkers = app.engine.eligible_checkers(&actor, id)?;
            if json {
                print_json(&checkers)?;
            } else {
                println!("Eligible reviewers for request #{}:", id);
                print_users(&checkers);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload(None).unwrap(), Value::Null);
        assert_eq!(
            parse_payload(Some(r#"{"employee_id": "E-9"}"#)).unwrap(),
            serde_json::json!({"employee_id": "E-9"})
        );
        assert!(parse_payload(Some("{not json")).is_err());
    }
}
