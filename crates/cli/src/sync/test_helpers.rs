//! Shared fixtures: two related models over an in-memory SQLite store.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::rc::Rc;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use rusqlite::Connection as DbConnection;

use sfb_core::{Record, RecordSchema, Result as CoreResult, ScalarKind, ScalarValue};

use crate::client::Connection;
use crate::error::Result;
use crate::store::{sync_columns_ddl, SyncStore};
use crate::sync::Syncer;

pub fn account_schema() -> &'static RecordSchema {
    static SCHEMA: OnceLock<RecordSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        RecordSchema::builder("Account")
            .field("name", "Name", ScalarKind::Text)
            .read_only_field("created_date", "CreatedDate", ScalarKind::DateTime)
            .computed("display_name", "Description")
            .build()
            .unwrap()
    })
}

/// Addressed remotely by an external-id field instead of `Id`.
pub fn lead_schema() -> &'static RecordSchema {
    static SCHEMA: OnceLock<RecordSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        RecordSchema::builder("Lead")
            .remote_key_field("Email__c")
            .local_key_field("email")
            .field("email", "Email__c", ScalarKind::Text)
            .field("company", "Company", ScalarKind::Text)
            .build()
            .unwrap()
    })
}

pub fn contact_schema() -> &'static RecordSchema {
    static SCHEMA: OnceLock<RecordSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        RecordSchema::builder("Contact")
            .field("last_name", "LastName", ScalarKind::Text)
            .field("account.salesforce_id", "AccountId", ScalarKind::Text)
            .build()
            .unwrap()
    })
}

#[derive(Debug, Clone, Default)]
pub struct Account {
    pub id: Option<i64>,
    pub name: Option<String>,
    /// Remote-computed; pulled, never pushed. Not persisted here.
    pub created_date: Option<DateTime<Utc>>,
    pub salesforce_id: Option<String>,
    pub sync_at: Option<DateTime<Utc>>,
    pub modify_at: Option<DateTime<Utc>>,
}

impl Record for Account {
    fn schema(&self) -> &RecordSchema {
        account_schema()
    }

    fn local_id(&self) -> Option<i64> {
        self.id
    }

    fn remote_id(&self) -> Option<String> {
        self.salesforce_id.clone()
    }

    fn set_remote_id(&mut self, id: Option<String>) {
        self.salesforce_id = id;
    }

    fn sync_at(&self) -> Option<DateTime<Utc>> {
        self.sync_at
    }

    fn set_sync_at(&mut self, at: Option<DateTime<Utc>>) {
        self.sync_at = at;
    }

    fn modify_at(&self) -> DateTime<Utc> {
        self.modify_at.unwrap_or_default()
    }

    fn get(&self, leaf: &str) -> CoreResult<ScalarValue> {
        match leaf {
            "name" => Ok(text_or_null(&self.name)),
            "salesforce_id" => Ok(text_or_null(&self.salesforce_id)),
            "created_date" => Ok(match self.created_date {
                Some(at) => ScalarValue::DateTime(at),
                None => ScalarValue::Null,
            }),
            // Computed property.
            "display_name" => Ok(match &self.name {
                Some(name) => ScalarValue::Text(format!("Account: {}", name)),
                None => ScalarValue::Null,
            }),
            other => Err(sfb_core::Error::UnknownField(other.to_string())),
        }
    }

    fn set(&mut self, leaf: &str, value: ScalarValue) -> CoreResult<()> {
        match leaf {
            "name" => self.name = value.as_text().map(str::to_string),
            "created_date" => {
                self.created_date = match value {
                    ScalarValue::DateTime(at) => Some(at),
                    _ => None,
                }
            }
            other => return Err(sfb_core::Error::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Contact {
    pub id: Option<i64>,
    pub last_name: Option<String>,
    pub account_id: Option<i64>,
    pub salesforce_id: Option<String>,
    pub sync_at: Option<DateTime<Utc>>,
    pub modify_at: Option<DateTime<Utc>>,
}

impl Record for Contact {
    fn schema(&self) -> &RecordSchema {
        contact_schema()
    }

    fn local_id(&self) -> Option<i64> {
        self.id
    }

    fn remote_id(&self) -> Option<String> {
        self.salesforce_id.clone()
    }

    fn set_remote_id(&mut self, id: Option<String>) {
        self.salesforce_id = id;
    }

    fn sync_at(&self) -> Option<DateTime<Utc>> {
        self.sync_at
    }

    fn set_sync_at(&mut self, at: Option<DateTime<Utc>>) {
        self.sync_at = at;
    }

    fn modify_at(&self) -> DateTime<Utc> {
        self.modify_at.unwrap_or_default()
    }

    fn get(&self, leaf: &str) -> CoreResult<ScalarValue> {
        match leaf {
            "last_name" => Ok(text_or_null(&self.last_name)),
            "salesforce_id" => Ok(text_or_null(&self.salesforce_id)),
            other => Err(sfb_core::Error::UnknownField(other.to_string())),
        }
    }

    fn set(&mut self, leaf: &str, value: ScalarValue) -> CoreResult<()> {
        match leaf {
            "last_name" => self.last_name = value.as_text().map(str::to_string),
            other => return Err(sfb_core::Error::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lead {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub salesforce_id: Option<String>,
    pub sync_at: Option<DateTime<Utc>>,
    pub modify_at: Option<DateTime<Utc>>,
}

impl Record for Lead {
    fn schema(&self) -> &RecordSchema {
        lead_schema()
    }

    fn local_id(&self) -> Option<i64> {
        self.id
    }

    fn remote_id(&self) -> Option<String> {
        self.salesforce_id.clone()
    }

    fn set_remote_id(&mut self, id: Option<String>) {
        self.salesforce_id = id;
    }

    fn sync_at(&self) -> Option<DateTime<Utc>> {
        self.sync_at
    }

    fn set_sync_at(&mut self, at: Option<DateTime<Utc>>) {
        self.sync_at = at;
    }

    fn modify_at(&self) -> DateTime<Utc> {
        self.modify_at.unwrap_or_default()
    }

    fn get(&self, leaf: &str) -> CoreResult<ScalarValue> {
        match leaf {
            "email" => Ok(text_or_null(&self.email)),
            "company" => Ok(text_or_null(&self.company)),
            "salesforce_id" => Ok(text_or_null(&self.salesforce_id)),
            other => Err(sfb_core::Error::UnknownField(other.to_string())),
        }
    }

    fn set(&mut self, leaf: &str, value: ScalarValue) -> CoreResult<()> {
        match leaf {
            "email" => self.email = value.as_text().map(str::to_string),
            "company" => self.company = value.as_text().map(str::to_string),
            other => return Err(sfb_core::Error::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

fn text_or_null(value: &Option<String>) -> ScalarValue {
    match value {
        Some(s) => ScalarValue::Text(s.clone()),
        None => ScalarValue::Null,
    }
}

/// In-memory database with both tables, sync columns embedded.
pub fn test_db() -> Rc<DbConnection> {
    let db = DbConnection::open_in_memory().unwrap();
    db.execute_batch(&format!(
        "CREATE TABLE accounts (
            id INTEGER PRIMARY KEY,
            name TEXT,
            {ddl}
        );
        CREATE TABLE contacts (
            id INTEGER PRIMARY KEY,
            last_name TEXT,
            account_id INTEGER REFERENCES accounts(id),
            {ddl}
        );
        CREATE TABLE leads (
            id INTEGER PRIMARY KEY,
            email TEXT,
            company TEXT,
            {ddl}
        );",
        ddl = sync_columns_ddl()
    ))
    .unwrap();
    Rc::new(db)
}

fn to_db(at: &Option<DateTime<Utc>>) -> Option<String> {
    at.map(|t| t.to_rfc3339())
}

fn from_db(text: Option<String>) -> Option<DateTime<Utc>> {
    text.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}

pub struct AccountStore {
    pub db: Rc<DbConnection>,
}

impl AccountStore {
    fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
        Ok(Account {
            id: row.get(0)?,
            name: row.get(1)?,
            created_date: None,
            salesforce_id: row.get(2)?,
            sync_at: from_db(row.get(3)?),
            modify_at: from_db(row.get(4)?),
        })
    }
}

const ACCOUNT_COLS: &str = "id, name, salesforce_id, sync_at, modify_at";

impl SyncStore for AccountStore {
    type Rec = Account;

    fn new_record(&self) -> Account {
        Account::default()
    }

    fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Account>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM accounts WHERE salesforce_id = ? ORDER BY id",
            ACCOUNT_COLS
        ))?;
        let mut rows: Vec<Account> = stmt
            .query_map([remote_id], Self::row_to_account)?
            .collect::<rusqlite::Result<_>>()?;
        if rows.len() > 1 {
            tracing::error!(remote_id, count = rows.len(), "duplicate salesforce_id, using first");
        }
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    fn all(&self) -> Result<Vec<Account>> {
        let mut stmt = self
            .db
            .prepare(&format!("SELECT {} FROM accounts ORDER BY id", ACCOUNT_COLS))?;
        let rows = stmt
            .query_map([], Self::row_to_account)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    fn save(&self, record: &mut Account) -> Result<()> {
        let now = Utc::now();
        record.modify_at = Some(now);
        match record.id {
            Some(id) => {
                self.db.execute(
                    "UPDATE accounts SET name = ?, salesforce_id = ?, sync_at = ?, modify_at = ? WHERE id = ?",
                    rusqlite::params![
                        record.name,
                        record.salesforce_id,
                        to_db(&record.sync_at),
                        now.to_rfc3339(),
                        id
                    ],
                )?;
            }
            None => {
                self.db.execute(
                    "INSERT INTO accounts (name, salesforce_id, sync_at, modify_at, create_at) VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![
                        record.name,
                        record.salesforce_id,
                        to_db(&record.sync_at),
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )?;
                record.id = Some(self.db.last_insert_rowid());
            }
        }
        Ok(())
    }

    fn save_sync_fields(&self, record: &mut Account) -> Result<()> {
        if record.id.is_none() {
            return self.save(record);
        }
        self.db.execute(
            "UPDATE accounts SET salesforce_id = ?, sync_at = ? WHERE id = ?",
            rusqlite::params![record.salesforce_id, to_db(&record.sync_at), record.id],
        )?;
        Ok(())
    }

    fn delete_stale(&self, keep_local_ids: &[i64]) -> Result<Vec<Account>> {
        let stale: Vec<Account> = self
            .all()?
            .into_iter()
            .filter(|a| a.id.is_some_and(|id| !keep_local_ids.contains(&id)))
            .collect();
        self.delete_records(&stale)?;
        Ok(stale)
    }

    fn delete_records(&self, records: &[Account]) -> Result<()> {
        let tx = self.db.unchecked_transaction()?;
        for record in records {
            if let Some(id) = record.id {
                tx.execute("DELETE FROM accounts WHERE id = ?", [id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

pub struct ContactStore {
    pub db: Rc<DbConnection>,
}

impl ContactStore {
    fn row_to_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
        Ok(Contact {
            id: row.get(0)?,
            last_name: row.get(1)?,
            account_id: row.get(2)?,
            salesforce_id: row.get(3)?,
            sync_at: from_db(row.get(4)?),
            modify_at: from_db(row.get(5)?),
        })
    }
}

const CONTACT_COLS: &str = "id, last_name, account_id, salesforce_id, sync_at, modify_at";

impl SyncStore for ContactStore {
    type Rec = Contact;

    fn new_record(&self) -> Contact {
        Contact::default()
    }

    fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Contact>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM contacts WHERE salesforce_id = ? ORDER BY id",
            CONTACT_COLS
        ))?;
        let mut rows: Vec<Contact> = stmt
            .query_map([remote_id], Self::row_to_contact)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    fn all(&self) -> Result<Vec<Contact>> {
        let mut stmt = self
            .db
            .prepare(&format!("SELECT {} FROM contacts ORDER BY id", CONTACT_COLS))?;
        let rows = stmt
            .query_map([], Self::row_to_contact)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    fn save(&self, record: &mut Contact) -> Result<()> {
        let now = Utc::now();
        record.modify_at = Some(now);
        match record.id {
            Some(id) => {
                self.db.execute(
                    "UPDATE contacts SET last_name = ?, account_id = ?, salesforce_id = ?, sync_at = ?, modify_at = ? WHERE id = ?",
                    rusqlite::params![
                        record.last_name,
                        record.account_id,
                        record.salesforce_id,
                        to_db(&record.sync_at),
                        now.to_rfc3339(),
                        id
                    ],
                )?;
            }
            None => {
                self.db.execute(
                    "INSERT INTO contacts (last_name, account_id, salesforce_id, sync_at, modify_at, create_at) VALUES (?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        record.last_name,
                        record.account_id,
                        record.salesforce_id,
                        to_db(&record.sync_at),
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )?;
                record.id = Some(self.db.last_insert_rowid());
            }
        }
        Ok(())
    }

    fn save_sync_fields(&self, record: &mut Contact) -> Result<()> {
        if record.id.is_none() {
            return self.save(record);
        }
        self.db.execute(
            "UPDATE contacts SET salesforce_id = ?, sync_at = ? WHERE id = ?",
            rusqlite::params![record.salesforce_id, to_db(&record.sync_at), record.id],
        )?;
        Ok(())
    }

    fn delete_stale(&self, keep_local_ids: &[i64]) -> Result<Vec<Contact>> {
        let stale: Vec<Contact> = self
            .all()?
            .into_iter()
            .filter(|c| c.id.is_some_and(|id| !keep_local_ids.contains(&id)))
            .collect();
        self.delete_records(&stale)?;
        Ok(stale)
    }

    fn delete_records(&self, records: &[Contact]) -> Result<()> {
        let tx = self.db.unchecked_transaction()?;
        for record in records {
            if let Some(id) = record.id {
                tx.execute("DELETE FROM contacts WHERE id = ?", [id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn find_relation_by_remote_id(
        &self,
        relation: &str,
        remote_id: &str,
    ) -> Result<Option<ScalarValue>> {
        assert_eq!(relation, "account");
        let mut stmt = self
            .db
            .prepare("SELECT id FROM accounts WHERE salesforce_id = ? ORDER BY id")?;
        let ids: Vec<i64> = stmt
            .query_map([remote_id], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        if ids.len() > 1 {
            tracing::error!(remote_id, count = ids.len(), "duplicate related salesforce_id, using first");
        }
        Ok(ids.first().map(|id| ScalarValue::Integer(*id)))
    }

    fn create_relation_from_remote(
        &self,
        conn: &Connection,
        relation: &str,
        remote_id: &str,
    ) -> Result<Option<ScalarValue>> {
        assert_eq!(relation, "account");
        let accounts = AccountStore {
            db: Rc::clone(&self.db),
        };
        let mut account = Account {
            salesforce_id: Some(remote_id.to_string()),
            ..Account::default()
        };
        match Syncer::new(conn, &accounts).pull(&mut account) {
            Ok(true) => Ok(account.id.map(ScalarValue::Integer)),
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::warn!(remote_id, error = %e, "could not pull related account");
                Ok(None)
            }
        }
    }

    fn set_relation(
        &self,
        record: &mut Contact,
        relation: &str,
        value: ScalarValue,
    ) -> Result<()> {
        assert_eq!(relation, "account");
        record.account_id = match value {
            ScalarValue::Integer(id) => Some(id),
            ScalarValue::Null => None,
            other => panic!("unexpected relation value: {:?}", other),
        };
        Ok(())
    }

    fn related_leaf_value(
        &self,
        record: &Contact,
        relation: &str,
        leaf: &str,
    ) -> Result<Option<ScalarValue>> {
        assert_eq!(relation, "account");
        let Some(account_id) = record.account_id else {
            return Ok(None);
        };
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM accounts WHERE id = ?",
            ACCOUNT_COLS
        ))?;
        let account = stmt
            .query_row([account_id], AccountStore::row_to_account)
            .map_err(crate::error::Error::from)?;
        Ok(Some(account.get(leaf)?))
    }
}

pub struct LeadStore {
    pub db: Rc<DbConnection>,
}

impl LeadStore {
    fn row_to_lead(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
        Ok(Lead {
            id: row.get(0)?,
            email: row.get(1)?,
            company: row.get(2)?,
            salesforce_id: row.get(3)?,
            sync_at: from_db(row.get(4)?),
            modify_at: from_db(row.get(5)?),
        })
    }
}

const LEAD_COLS: &str = "id, email, company, salesforce_id, sync_at, modify_at";

impl SyncStore for LeadStore {
    type Rec = Lead;

    fn new_record(&self) -> Lead {
        Lead::default()
    }

    fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Lead>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM leads WHERE salesforce_id = ? ORDER BY id",
            LEAD_COLS
        ))?;
        let mut rows: Vec<Lead> = stmt
            .query_map([remote_id], Self::row_to_lead)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    fn all(&self) -> Result<Vec<Lead>> {
        let mut stmt = self
            .db
            .prepare(&format!("SELECT {} FROM leads ORDER BY id", LEAD_COLS))?;
        let rows = stmt
            .query_map([], Self::row_to_lead)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    fn save(&self, record: &mut Lead) -> Result<()> {
        let now = Utc::now();
        record.modify_at = Some(now);
        match record.id {
            Some(id) => {
                self.db.execute(
                    "UPDATE leads SET email = ?, company = ?, salesforce_id = ?, sync_at = ?, modify_at = ? WHERE id = ?",
                    rusqlite::params![
                        record.email,
                        record.company,
                        record.salesforce_id,
                        to_db(&record.sync_at),
                        now.to_rfc3339(),
                        id
                    ],
                )?;
            }
            None => {
                self.db.execute(
                    "INSERT INTO leads (email, company, salesforce_id, sync_at, modify_at, create_at) VALUES (?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        record.email,
                        record.company,
                        record.salesforce_id,
                        to_db(&record.sync_at),
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )?;
                record.id = Some(self.db.last_insert_rowid());
            }
        }
        Ok(())
    }

    fn save_sync_fields(&self, record: &mut Lead) -> Result<()> {
        if record.id.is_none() {
            return self.save(record);
        }
        self.db.execute(
            "UPDATE leads SET salesforce_id = ?, sync_at = ? WHERE id = ?",
            rusqlite::params![record.salesforce_id, to_db(&record.sync_at), record.id],
        )?;
        Ok(())
    }

    fn delete_stale(&self, keep_local_ids: &[i64]) -> Result<Vec<Lead>> {
        let stale: Vec<Lead> = self
            .all()?
            .into_iter()
            .filter(|l| l.id.is_some_and(|id| !keep_local_ids.contains(&id)))
            .collect();
        self.delete_records(&stale)?;
        Ok(stale)
    }

    fn delete_records(&self, records: &[Lead]) -> Result<()> {
        let tx = self.db.unchecked_transaction()?;
        for record in records {
            if let Some(id) = record.id {
                tx.execute("DELETE FROM leads WHERE id = ?", [id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
