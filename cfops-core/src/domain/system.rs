//! System info records
//!
//! Each data store the platform keeps state in (the controller's Postgres,
//! MySQL, the NFS blobstore) is described by the same set of credentials.
//! The variant decides how the external dump tool is invoked.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Port the platform's Postgres listens on
pub const POSTGRES_PORT: u16 = 2544;

/// SSH port used to reach the data store VM
pub const SSH_PORT: u16 = 22;

/// Errors raised while reading or validating a system info record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemInfoError {
    #[error("invalid or incomplete {kind} system info: missing {}", join_fields(.missing))]
    Incomplete {
        kind: SystemKind,
        missing: Vec<SystemField>,
    },

    #[error("unknown system info field '{0}'")]
    UnknownField(String),

    #[error("unknown system kind '{0}'")]
    UnknownKind(String),
}

fn join_fields(fields: &[SystemField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Named field of [`SystemCredentials`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemField {
    Product,
    Component,
    Identity,
    Ip,
    User,
    Pass,
    VcapUser,
    VcapPass,
}

impl SystemField {
    pub const ALL: [SystemField; 8] = [
        SystemField::Product,
        SystemField::Component,
        SystemField::Identity,
        SystemField::Ip,
        SystemField::User,
        SystemField::Pass,
        SystemField::VcapUser,
        SystemField::VcapPass,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SystemField::Product => "Product",
            SystemField::Component => "Component",
            SystemField::Identity => "Identity",
            SystemField::Ip => "Ip",
            SystemField::User => "User",
            SystemField::Pass => "Pass",
            SystemField::VcapUser => "VcapUser",
            SystemField::VcapPass => "VcapPass",
        }
    }
}

impl fmt::Display for SystemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemField {
    type Err = SystemInfoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SystemField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SystemInfoError::UnknownField(s.to_string()))
    }
}

/// Credentials shared by every system info variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemCredentials {
    pub product: String,
    pub component: String,
    pub identity: String,
    pub ip: String,
    pub user: String,
    pub pass: String,
    pub vcap_user: String,
    pub vcap_pass: String,
}

impl SystemCredentials {
    pub fn get(&self, field: SystemField) -> &str {
        match field {
            SystemField::Product => &self.product,
            SystemField::Component => &self.component,
            SystemField::Identity => &self.identity,
            SystemField::Ip => &self.ip,
            SystemField::User => &self.user,
            SystemField::Pass => &self.pass,
            SystemField::VcapUser => &self.vcap_user,
            SystemField::VcapPass => &self.vcap_pass,
        }
    }

    pub fn set(&mut self, field: SystemField, value: impl Into<String>) {
        let slot = match field {
            SystemField::Product => &mut self.product,
            SystemField::Component => &mut self.component,
            SystemField::Identity => &mut self.identity,
            SystemField::Ip => &mut self.ip,
            SystemField::User => &mut self.user,
            SystemField::Pass => &mut self.pass,
            SystemField::VcapUser => &mut self.vcap_user,
            SystemField::VcapPass => &mut self.vcap_pass,
        };
        *slot = value.into();
    }

    /// Fields that are still empty
    pub fn missing(&self) -> Vec<SystemField> {
        SystemField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_empty())
            .collect()
    }

    fn ssh(&self) -> SshConfig {
        SshConfig {
            username: self.vcap_user.clone(),
            password: self.vcap_pass.clone(),
            host: self.ip.clone(),
            port: SSH_PORT,
        }
    }
}

/// SSH coordinates of the VM hosting a data store
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Instructions handed to the external dump tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum DumpPlan {
    PostgresRemote {
        port: u16,
        database: String,
        user: String,
        password: String,
        ssh: SshConfig,
    },
    MysqlRemote {
        user: String,
        password: String,
        ssh: SshConfig,
    },
    Nfs {
        password: String,
        host: String,
    },
}

const REDACTED: &str = "***";

impl DumpPlan {
    /// Copy of the plan with every password masked, fit for printing
    pub fn redacted(&self) -> DumpPlan {
        let mut plan = self.clone();
        match &mut plan {
            DumpPlan::PostgresRemote { password, ssh, .. }
            | DumpPlan::MysqlRemote { password, ssh, .. } => {
                *password = REDACTED.to_string();
                ssh.password = REDACTED.to_string();
            }
            DumpPlan::Nfs { password, .. } => *password = REDACTED.to_string(),
        }
        plan
    }
}

/// Something that can describe how its data is dumped
pub trait DumpSource {
    fn dump_plan(&self) -> Result<DumpPlan, SystemInfoError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgInfo {
    pub credentials: SystemCredentials,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MysqlInfo {
    pub credentials: SystemCredentials,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfsInfo {
    pub credentials: SystemCredentials,
}

impl DumpSource for PgInfo {
    fn dump_plan(&self) -> Result<DumpPlan, SystemInfoError> {
        let c = &self.credentials;
        Ok(DumpPlan::PostgresRemote {
            port: POSTGRES_PORT,
            database: c.component.clone(),
            user: c.user.clone(),
            password: c.pass.clone(),
            ssh: c.ssh(),
        })
    }
}

impl DumpSource for MysqlInfo {
    fn dump_plan(&self) -> Result<DumpPlan, SystemInfoError> {
        let c = &self.credentials;
        Ok(DumpPlan::MysqlRemote {
            user: c.user.clone(),
            password: c.pass.clone(),
            ssh: c.ssh(),
        })
    }
}

impl DumpSource for NfsInfo {
    fn dump_plan(&self) -> Result<DumpPlan, SystemInfoError> {
        let c = &self.credentials;
        Ok(DumpPlan::Nfs {
            password: c.pass.clone(),
            host: c.ip.clone(),
        })
    }
}

/// Kind of data store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    Postgres,
    Mysql,
    Nfs,
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemKind::Postgres => write!(f, "postgres"),
            SystemKind::Mysql => write!(f, "mysql"),
            SystemKind::Nfs => write!(f, "nfs"),
        }
    }
}

impl FromStr for SystemKind {
    type Err = SystemInfoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(SystemKind::Postgres),
            "mysql" => Ok(SystemKind::Mysql),
            "nfs" => Ok(SystemKind::Nfs),
            other => Err(SystemInfoError::UnknownKind(other.to_string())),
        }
    }
}

/// A data store record, one variant per kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SystemInfo {
    Postgres(PgInfo),
    Mysql(MysqlInfo),
    Nfs(NfsInfo),
}

impl SystemInfo {
    pub fn new(kind: SystemKind, credentials: SystemCredentials) -> Self {
        match kind {
            SystemKind::Postgres => SystemInfo::Postgres(PgInfo { credentials }),
            SystemKind::Mysql => SystemInfo::Mysql(MysqlInfo { credentials }),
            SystemKind::Nfs => SystemInfo::Nfs(NfsInfo { credentials }),
        }
    }

    pub fn kind(&self) -> SystemKind {
        match self {
            SystemInfo::Postgres(_) => SystemKind::Postgres,
            SystemInfo::Mysql(_) => SystemKind::Mysql,
            SystemInfo::Nfs(_) => SystemKind::Nfs,
        }
    }

    pub fn credentials(&self) -> &SystemCredentials {
        match self {
            SystemInfo::Postgres(info) => &info.credentials,
            SystemInfo::Mysql(info) => &info.credentials,
            SystemInfo::Nfs(info) => &info.credentials,
        }
    }

    pub fn credentials_mut(&mut self) -> &mut SystemCredentials {
        match self {
            SystemInfo::Postgres(info) => &mut info.credentials,
            SystemInfo::Mysql(info) => &mut info.credentials,
            SystemInfo::Nfs(info) => &mut info.credentials,
        }
    }

    pub fn get(&self, field: SystemField) -> &str {
        self.credentials().get(field)
    }

    pub fn set(&mut self, field: SystemField, value: impl Into<String>) {
        self.credentials_mut().set(field, value);
    }

    /// Every credential field must be non-empty
    pub fn validate(&self) -> Result<(), SystemInfoError> {
        let missing = self.credentials().missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SystemInfoError::Incomplete {
                kind: self.kind(),
                missing,
            })
        }
    }
}

impl DumpSource for SystemInfo {
    fn dump_plan(&self) -> Result<DumpPlan, SystemInfoError> {
        self.validate()?;
        match self {
            SystemInfo::Postgres(info) => info.dump_plan(),
            SystemInfo::Mysql(info) => info.dump_plan(),
            SystemInfo::Nfs(info) => info.dump_plan(),
        }
    }
}
