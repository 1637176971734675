//! Administration command handlers

use super::admin::AdminCommands;
use super::context::print_json;
use anyhow::Result;
use checkflow_core::identity::{UserFilter, UserUpdate};
use checkflow_core::models::{NewUnit, NewUser, Role, Unit, UserSummary};
use checkflow_core::Checkflow;
use std::collections::BTreeSet;

fn role_list(roles: &BTreeSet<Role>) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(",")
}

fn print_user(user: &UserSummary) {
    println!("User {}", user.id);
    println!("  Employee id: {}", user.employee_id);
    println!("  Name:        {}", user.display_name);
    if !user.designation.is_empty() {
        println!("  Designation: {}", user.designation);
    }
    println!("  Roles:       {}", role_list(&user.roles));
    match user.unit {
        Some(unit) => println!("  Unit:        {}", unit),
        None => println!("  Unit:        (none)"),
    }
    println!(
        "  Status:      {}",
        if user.active { "active" } else { "inactive" }
    );
}

fn print_unit(unit: &Unit) {
    println!(
        "🏢 Unit {} [{}] {} ({})",
        unit.id, unit.code, unit.name, unit.unit_type
    );
}

fn show_user(user: &UserSummary, json: bool, headline: &str) -> Result<()> {
    if json {
        print_json(user)
    } else {
        println!("{}", headline);
        print_user(user);
        Ok(())
    }
}

fn show_unit(unit: &Unit, json: bool, headline: &str) -> Result<()> {
    if json {
        print_json(unit)
    } else {
        println!("{}", headline);
        print_unit(unit);
        Ok(())
    }
}

pub fn handle_admin_command(app: &Checkflow, command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::Bootstrap {
            employee_id,
            name,
            credential,
        } => {
            let user = app.directory.bootstrap(&employee_id, &name, &credential)?;
            println!("✅ Directory initialized");
            print_user(&user);
        }
        AdminCommands::UserCreate {
            employee_id,
            name,
            designation,
            roles,
            unit,
            new_credential,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let user = app.directory.create_user(
                &actor,
                NewUser {
                    display_name: name,
                    employee_id,
                    designation,
                    roles: roles.into_iter().collect(),
                    unit,
                    credential: new_credential,
                },
            )?;
            show_user(&user, json, "✅ User created")?;
        }
        AdminCommands::UserList {
            unit,
            active,
            search,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let filter = UserFilter {
                unit,
                active,
                search,
            };
            let users = app.directory.list_users(&actor, &filter)?;
            if json {
                print_json(&users)?;
            } else {
                println!("Users ({}):", users.len());
                for user in &users {
                    println!(
                        "  {:<5} {:<12} {:<24} [{}] {}{}",
                        user.id,
                        user.employee_id,
                        user.display_name,
                        role_list(&user.roles),
                        user.unit
                            .map(|u| format!("unit {}", u))
                            .unwrap_or_else(|| "no unit".to_string()),
                        if user.active { "" } else { " (inactive)" }
                    );
                }
            }
        }
        AdminCommands::UserShow { id, actor, json } => {
            let actor = actor.login(app)?;
            let user = app.directory.get_user(&actor, id)?;
            if json {
                print_json(&user)?;
            } else {
                print_user(&user);
            }
        }
        AdminCommands::UserUpdate {
            id,
            name,
            designation,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let update = UserUpdate {
                display_name: name,
                designation,
            };
            let user = app.directory.update_user(&actor, id, update)?;
            show_user(&user, json, "✅ User updated")?;
        }
        AdminCommands::AssignRoles {
            id,
            roles,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let user = app
                .directory
                .assign_roles(&actor, id, roles.into_iter().collect())?;
            show_user(&user, json, "✅ Roles assigned")?;
        }
        AdminCommands::AssignUnit {
            id,
            unit,
            none: _,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let user = app.directory.assign_unit(&actor, id, unit)?;
            show_user(&user, json, "✅ Unit assigned")?;
        }
        AdminCommands::Deactivate { id, actor, json } => {
            let actor = actor.login(app)?;
            let user = app.directory.deactivate_user(&actor, id)?;
            show_user(&user, json, "🔒 User deactivated")?;
        }
        AdminCommands::Reactivate { id, actor, json } => {
            let actor = actor.login(app)?;
            let user = app.directory.reactivate_user(&actor, id)?;
            show_user(&user, json, "🔓 User reactivated")?;
        }
        AdminCommands::ResetCredential {
            id,
            new_credential,
            actor,
        } => {
            let actor = actor.login(app)?;
            app.directory.reset_credential(&actor, id, &new_credential)?;
            println!("🔑 Credential reset for user {}", id);
        }
        AdminCommands::UnitCreate {
            code,
            name,
            unit_type,
            parent,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let unit = app.directory.create_unit(
                &actor,
                NewUnit {
                    code,
                    name,
                    unit_type,
                    parent,
                },
            )?;
            show_unit(&unit, json, "✅ Unit created")?;
        }
        AdminCommands::UnitList { actor, json } => {
            let actor = actor.login(app)?;
            let units = app.directory.list_units(&actor)?;
            if json {
                print_json(&units)?;
            } else {
                let hierarchy = app.directory.hierarchy()?;
                println!("Units ({}):", units.len());
                for unit in &units {
                    let path = hierarchy
                        .path_display(unit.id)
                        .unwrap_or_else(|_| unit.code.clone());
                    println!(
                        "  {:<5} {:<10} {:<12} {} ({})",
                        unit.id,
                        unit.code,
                        unit.unit_type.as_str(),
                        unit.name,
                        path
                    );
                }
            }
        }
        AdminCommands::UnitRename {
            id,
            name,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let unit = app.directory.rename_unit(&actor, id, &name)?;
            show_unit(&unit, json, "✅ Unit renamed")?;
        }
        AdminCommands::UnitMove {
            id,
            parent,
            root: _,
            actor,
            json,
        } => {
            let actor = actor.login(app)?;
            let unit = app.directory.move_unit(&actor, id, parent)?;
            show_unit(&unit, json, "✅ Unit moved")?;
        }
        AdminCommands::Roles { actor, json } => {
            let actor = actor.login(app)?;
            let roles = app.directory.list_roles(&actor)?;
            if json {
                print_json(&roles)?;
            } else {
                println!("Roles:");
                for role in &roles {
                    println!("  {:<12} {}", role.name.as_str(), role.description);
                }
            }
        }
    }
    Ok(())
}
