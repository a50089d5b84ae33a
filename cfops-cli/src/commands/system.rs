//! System command handlers
//!
//! Validates data store records and shows how each would be dumped.

use anyhow::{Context, Result, anyhow};
use cfops_core::domain::system::{
    DumpSource, SystemCredentials, SystemField, SystemInfo, SystemKind,
};
use clap::Subcommand;
use colored::*;

/// System subcommands
#[derive(Subcommand)]
pub enum SystemCommands {
    /// Validate a record and print its dump plan
    Plan {
        /// Data store kind (postgres, mysql or nfs)
        #[arg(long)]
        kind: SystemKind,

        /// Record field as Name=value (e.g. Ip=10.0.16.5), repeatable
        #[arg(long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },
}

/// Handle system commands
pub fn handle_system_command(command: SystemCommands) -> Result<()> {
    match command {
        SystemCommands::Plan { kind, fields } => {
            let info = parse_record(kind, &fields)?;
            let plan = info.dump_plan()?;

            println!("{}", format!("Dump plan for {} record:", info.kind()).bold());
            println!("{}", serde_json::to_string_pretty(&plan.redacted())?);
            Ok(())
        }
    }
}

/// Build a record from `Name=value` pairs
fn parse_record(kind: SystemKind, fields: &[String]) -> Result<SystemInfo> {
    let mut info = SystemInfo::new(kind, SystemCredentials::default());

    for pair in fields {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{}'", pair))?;
        let field: SystemField = name
            .trim()
            .parse()
            .with_context(|| format!("Invalid field in '{}'", pair))?;
        info.set(field, value);
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfops_core::domain::system::DumpPlan;

    #[test]
    fn test_parse_record_sets_fields() {
        let info = parse_record(
            SystemKind::Nfs,
            &["Ip=10.0.16.5".to_string(), "pass=secret".to_string()],
        )
        .unwrap();

        assert_eq!(info.get(SystemField::Ip), "10.0.16.5");
        assert_eq!(info.get(SystemField::Pass), "secret");
    }

    #[test]
    fn test_parse_record_rejects_malformed_pair() {
        assert!(parse_record(SystemKind::Mysql, &["Ip".to_string()]).is_err());
        assert!(parse_record(SystemKind::Mysql, &["Hostname=x".to_string()]).is_err());
    }

    #[test]
    fn test_complete_record_yields_plan() {
        let fields: Vec<String> = [
            "Product=cf",
            "Component=mysql",
            "Identity=root",
            "Ip=10.0.16.9",
            "User=root",
            "Pass=pw",
            "VcapUser=vcap",
            "VcapPass=vpw",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let info = parse_record(SystemKind::Mysql, &fields).unwrap();
        let plan = info.dump_plan().unwrap();
        assert!(matches!(
            plan,
            DumpPlan::MysqlRemote { ref user, .. } if user == "root"
        ));

        let printed = serde_json::to_string_pretty(&plan.redacted()).unwrap();
        assert!(printed.contains("10.0.16.9"));
        assert!(!printed.contains("\"pw\""));
        assert!(!printed.contains("vpw"));
    }
}
