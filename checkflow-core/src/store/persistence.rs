//! Workflow state persistence using JSON file storage

use crate::models::{
    ApprovalRequest, AuditEvent, AuditLogEntry, NewApprovalRequest, NewUnit, NewUser, RequestId,
    RequestStatus, Unit, UnitId, User, UserId,
};
use crate::store::{StoreError, WorkflowStore};
use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Next identifiers to hand out, persisted with the data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counters {
    pub next_user: u64,
    pub next_unit: u64,
    pub next_request: u64,
    pub next_audit: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            next_user: 1,
            next_unit: 1,
            next_request: 1,
            next_audit: 1,
        }
    }
}

/// Root JSON document containing all workflow data
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JsonStore {
    #[serde(default)]
    pub counters: Counters,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub requests: Vec<ApprovalRequest>,
    /// Append-only, never rewritten
    #[serde(default)]
    pub audit: Vec<AuditLogEntry>,
}

impl JsonStore {
    fn push_audit(&mut self, event: AuditEvent) -> AuditLogEntry {
        let entry = AuditLogEntry::from_event(self.counters.next_audit, event);
        self.counters.next_audit += 1;
        self.audit.push(entry.clone());
        entry
    }

    /// Allocate the next request id and sequence its events under it
    fn push_request(
        &mut self,
        request: NewApprovalRequest,
        events: Vec<AuditEvent>,
    ) -> ApprovalRequest {
        let id = RequestId(self.counters.next_request);
        self.counters.next_request += 1;

        let record = request.into_request(id);
        self.requests.push(record.clone());
        for event in events {
            self.push_audit(AuditEvent {
                request_id: id,
                ..event
            });
        }
        record
    }

    fn employee_id_taken(&self, employee_id: &str, except: Option<UserId>) -> bool {
        self.users.iter().any(|u| {
            Some(u.id) != except && u.employee_id.eq_ignore_ascii_case(employee_id.trim())
        })
    }

    fn unit_code_taken(&self, code: &str, except: Option<UnitId>) -> bool {
        self.units
            .iter()
            .any(|u| Some(u.id) != except && u.code.eq_ignore_ascii_case(code.trim()))
    }
}

/// JSON-file backed [`WorkflowStore`].
///
/// The file is the source of truth: every read reloads it under a shared
/// lock, and every mutation re-reads, applies and rewrites it while holding
/// an exclusive lock, so several processes may share one store. The
/// in-memory copy only serves stores without a path.
pub struct JsonFileStore {
    /// Path to JSON store file, `None` keeps everything in memory
    store_path: Option<PathBuf>,
    /// Last document read or written
    store: Mutex<JsonStore>,
}

impl JsonFileStore {
    /// Open (or initialize) a store document at `store_path`
    pub fn new<P: AsRef<Path>>(store_path: P) -> Result<Self, StoreError> {
        let store_path = store_path.as_ref().to_path_buf();

        if let Some(parent) = store_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = if store_path.exists() {
            Self::load_store(&store_path)?
        } else {
            JsonStore::default()
        };

        tracing::debug!(path = %store_path.display(), "workflow store opened");

        Ok(Self {
            store_path: Some(store_path),
            store: Mutex::new(store),
        })
    }

    /// Store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            store_path: None,
            store: Mutex::new(JsonStore::default()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    /// Parse the document from the current position of `file`
    fn read_document(mut file: &File) -> Result<JsonStore, StoreError> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        if contents.trim().is_empty() {
            return Ok(JsonStore::default());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    /// Load JSON store from file with a shared lock
    fn load_store(path: &Path) -> Result<JsonStore, StoreError> {
        let file = File::open(path)?;
        file.lock_shared()?;
        let document = Self::read_document(&file);
        file.unlock()?;
        document
    }

    /// Replace the contents of `file` with `store`
    fn write_document(mut file: &File, store: &JsonStore) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(store)?;

        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    /// Re-read, mutate and rewrite the file. The caller holds the
    /// exclusive lock.
    fn commit_locked<T>(
        file: &File,
        f: impl FnOnce(&mut JsonStore) -> Result<T, StoreError>,
    ) -> Result<(JsonStore, T), StoreError> {
        let mut staged = Self::read_document(file)?;
        let out = f(&mut staged)?;
        Self::write_document(file, &staged)?;
        Ok((staged, out))
    }

    fn lock(&self) -> Result<MutexGuard<'_, JsonStore>, StoreError> {
        self.store.lock().map_err(|_| StoreError::Poisoned)
    }

    fn read<T>(&self, f: impl FnOnce(&JsonStore) -> T) -> Result<T, StoreError> {
        let mut store = self.lock()?;
        if let Some(path) = &self.store_path {
            if path.exists() {
                *store = Self::load_store(path)?;
            }
        }
        Ok(f(&store))
    }

    /// Apply `f` to a staged copy of the latest document, persist it, then
    /// publish it. A failing `f` leaves the file untouched.
    fn commit<T>(
        &self,
        f: impl FnOnce(&mut JsonStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut store = self.lock()?;

        let Some(path) = &self.store_path else {
            let mut staged = store.clone();
            let out = f(&mut staged)?;
            *store = staged;
            return Ok(out);
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.lock_exclusive()?;
        let committed = Self::commit_locked(&file, f);
        file.unlock()?;

        let (staged, out) = committed?;
        *store = staged;
        Ok(out)
    }
}

/// Guards fields that must never change once written
fn check_request_update(
    existing: &ApprovalRequest,
    updated: &ApprovalRequest,
) -> Result<(), StoreError> {
    if existing.creator != updated.creator
        || existing.maker_unit != updated.maker_unit
        || existing.request_type != updated.request_type
        || existing.created_at != updated.created_at
    {
        return Err(StoreError::Conflict(format!(
            "request {} creation fields are immutable",
            existing.id
        )));
    }
    if existing.assigned_checker.is_some() && existing.assigned_checker != updated.assigned_checker
    {
        return Err(StoreError::Conflict(format!(
            "request {} is already assigned",
            existing.id
        )));
    }
    if existing.status.is_terminal() && existing != updated {
        return Err(StoreError::Conflict(format!(
            "request {} is {}",
            existing.id, existing.status
        )));
    }
    Ok(())
}

impl WorkflowStore for JsonFileStore {
    fn insert_user(&self, user: NewUser, credential: Option<String>) -> Result<User, StoreError> {
        self.commit(|store| {
            if store.employee_id_taken(&user.employee_id, None) {
                return Err(StoreError::Duplicate {
                    entity: "employee id",
                    key: user.employee_id.trim().to_string(),
                });
            }
            let now = Utc::now();
            let record = User {
                id: UserId(store.counters.next_user),
                display_name: user.display_name,
                employee_id: user.employee_id.trim().to_string(),
                designation: user.designation,
                roles: user.roles,
                unit: user.unit,
                active: true,
                credential,
                created_at: now,
                updated_at: now,
            };
            store.counters.next_user += 1;
            store.users.push(record.clone());
            Ok(record)
        })
    }

    fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.commit(|store| {
            if store.employee_id_taken(&user.employee_id, Some(user.id)) {
                return Err(StoreError::Duplicate {
                    entity: "employee id",
                    key: user.employee_id.clone(),
                });
            }
            let slot = store
                .users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or(StoreError::Missing {
                    entity: "user",
                    id: user.id.value(),
                })?;
            *slot = user.clone();
            slot.updated_at = Utc::now();
            Ok(())
        })
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.read(|store| store.users.iter().find(|u| u.id == id).cloned())
    }

    fn find_user_by_employee_id(&self, employee_id: &str) -> Result<Option<User>, StoreError> {
        self.read(|store| {
            store
                .users
                .iter()
                .find(|u| u.employee_id.eq_ignore_ascii_case(employee_id.trim()))
                .cloned()
        })
    }

    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.read(|store| store.users.clone())
    }

    fn insert_unit(&self, unit: NewUnit) -> Result<Unit, StoreError> {
        self.commit(|store| {
            if store.unit_code_taken(&unit.code, None) {
                return Err(StoreError::Duplicate {
                    entity: "unit code",
                    key: unit.code.trim().to_string(),
                });
            }
            let now = Utc::now();
            let record = Unit {
                id: UnitId(store.counters.next_unit),
                code: unit.code.trim().to_string(),
                name: unit.name,
                unit_type: unit.unit_type,
                parent: unit.parent,
                created_at: now,
                updated_at: now,
            };
            store.counters.next_unit += 1;
            store.units.push(record.clone());
            Ok(record)
        })
    }

    fn update_unit(&self, unit: &Unit) -> Result<(), StoreError> {
        self.commit(|store| {
            if store.unit_code_taken(&unit.code, Some(unit.id)) {
                return Err(StoreError::Duplicate {
                    entity: "unit code",
                    key: unit.code.clone(),
                });
            }
            let slot = store
                .units
                .iter_mut()
                .find(|u| u.id == unit.id)
                .ok_or(StoreError::Missing {
                    entity: "unit",
                    id: unit.id.value(),
                })?;
            *slot = unit.clone();
            slot.updated_at = Utc::now();
            Ok(())
        })
    }

    fn get_unit(&self, id: UnitId) -> Result<Option<Unit>, StoreError> {
        self.read(|store| store.units.iter().find(|u| u.id == id).cloned())
    }

    fn list_units(&self) -> Result<Vec<Unit>, StoreError> {
        self.read(|store| store.units.clone())
    }

    fn insert_request(
        &self,
        request: NewApprovalRequest,
        events: Vec<AuditEvent>,
    ) -> Result<ApprovalRequest, StoreError> {
        self.commit(|store| Ok(store.push_request(request, events)))
    }

    fn insert_resubmission(
        &self,
        request: NewApprovalRequest,
        events: Vec<AuditEvent>,
    ) -> Result<ApprovalRequest, StoreError> {
        let original_id = request.resubmission_of.ok_or_else(|| {
            StoreError::Conflict("a resubmission must name its original request".to_string())
        })?;

        self.commit(|store| {
            let original = store
                .requests
                .iter()
                .find(|r| r.id == original_id)
                .ok_or(StoreError::Missing {
                    entity: "request",
                    id: original_id.value(),
                })?;
            if original.status != RequestStatus::Rejected {
                return Err(StoreError::Conflict(format!(
                    "request {} is {}",
                    original_id, original.status
                )));
            }

            let maker = request.creator;
            let record = store.push_request(request, events);
            store.push_audit(AuditEvent::resubmit(original_id, maker, record.id));
            Ok(record)
        })
    }

    fn update_request(
        &self,
        request: &ApprovalRequest,
        events: Vec<AuditEvent>,
    ) -> Result<(), StoreError> {
        self.commit(|store| {
            let slot = store
                .requests
                .iter_mut()
                .find(|r| r.id == request.id)
                .ok_or(StoreError::Missing {
                    entity: "request",
                    id: request.id.value(),
                })?;
            check_request_update(slot, request)?;
            *slot = request.clone();
            for event in events {
                if event.request_id != request.id {
                    return Err(StoreError::Conflict(format!(
                        "audit event for request {} committed with request {}",
                        event.request_id, request.id
                    )));
                }
                store.push_audit(event);
            }
            Ok(())
        })
    }

    fn get_request(&self, id: RequestId) -> Result<Option<ApprovalRequest>, StoreError> {
        self.read(|store| store.requests.iter().find(|r| r.id == id).cloned())
    }

    fn list_requests(&self) -> Result<Vec<ApprovalRequest>, StoreError> {
        self.read(|store| store.requests.clone())
    }

    fn append_audit(&self, event: AuditEvent) -> Result<AuditLogEntry, StoreError> {
        self.commit(|store| {
            if !store.requests.iter().any(|r| r.id == event.request_id) {
                return Err(StoreError::Missing {
                    entity: "request",
                    id: event.request_id.value(),
                });
            }
            Ok(store.push_audit(event))
        })
    }

    fn audit_trail(&self, request_id: RequestId) -> Result<Vec<AuditLogEntry>, StoreError> {
        self.read(|store| {
            let mut entries: Vec<_> = store
                .audit
                .iter()
                .filter(|e| e.request_id == request_id)
                .cloned()
                .collect();
            entries.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then(a.sequence.cmp(&b.sequence))
            });
            entries
        })
    }
}
