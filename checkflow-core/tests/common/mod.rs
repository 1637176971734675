//! Shared fixture: a small bank hierarchy with one maker and two checkers
//!
//! ```text
//! HO
//! ├── REG-3
//! │   └── BR-12   (maker)
//! └── REG-9
//! ```

#![allow(dead_code)]

use checkflow_core::identity::ActorContext;
use checkflow_core::models::{
    EngineSettings, NewUnit, NewUser, RequestType, Role, UnitId, UnitType, UserSummary,
};
use checkflow_core::workflow::RequestDraft;
use checkflow_core::Checkflow;
use serde_json::json;
use std::collections::BTreeSet;

pub struct Bank {
    pub app: Checkflow,
    pub root: ActorContext,
    pub head_office: UnitId,
    pub region_3: UnitId,
    pub region_9: UnitId,
    pub branch_12: UnitId,
    pub maker: ActorContext,
    pub checker_3: ActorContext,
    pub checker_9: ActorContext,
}

impl Bank {
    pub fn new() -> Self {
        Self::with_app(Checkflow::in_memory(EngineSettings::default()))
    }

    pub fn with_app(app: Checkflow) -> Self {
        let directory = app.directory.clone();
        directory
            .bootstrap("ROOT", "Root Admin", "root-secret")
            .unwrap();
        let root = directory.authenticate("ROOT", "root-secret").unwrap();

        let unit = |code: &str, unit_type: UnitType, parent: Option<UnitId>| {
            directory
                .create_unit(
                    &root,
                    NewUnit {
                        code: code.to_string(),
                        name: code.to_string(),
                        unit_type,
                        parent,
                    },
                )
                .unwrap()
                .id
        };
        let head_office = unit("HO", UnitType::HeadOffice, None);
        let region_3 = unit("REG-3", UnitType::Region, Some(head_office));
        let region_9 = unit("REG-9", UnitType::Region, Some(head_office));
        let branch_12 = unit("BR-12", UnitType::Branch, Some(region_3));

        let mut bank = Self {
            app,
            root,
            head_office,
            region_3,
            region_9,
            branch_12,
            maker: root,
            checker_3: root,
            checker_9: root,
        };
        bank.maker = bank.user("M-1", &[Role::Maker], branch_12);
        bank.checker_3 = bank.user("C-3", &[Role::Checker], region_3);
        bank.checker_9 = bank.user("C-9", &[Role::Checker], region_9);
        bank
    }

    /// Create a user and log them in
    pub fn user(&self, employee_id: &str, roles: &[Role], unit: UnitId) -> ActorContext {
        let secret = format!("{}-secret", employee_id);
        self.app
            .directory
            .create_user(
                &self.root,
                NewUser {
                    display_name: format!("User {}", employee_id),
                    employee_id: employee_id.to_string(),
                    designation: String::new(),
                    roles: roles.iter().copied().collect::<BTreeSet<_>>(),
                    unit: Some(unit),
                    credential: Some(secret.clone()),
                },
            )
            .unwrap();
        self.app.directory.authenticate(employee_id, &secret).unwrap()
    }

    pub fn summary(&self, actor: &ActorContext) -> UserSummary {
        self.app.directory.profile(actor).unwrap()
    }
}

pub fn draft(title: &str) -> RequestDraft {
    RequestDraft {
        request_type: RequestType::CreateUser,
        title: title.to_string(),
        description: format!("{} for branch 12", title),
        payload: json!({"employee_id": "T-77", "unit": "BR-12"}),
    }
}
