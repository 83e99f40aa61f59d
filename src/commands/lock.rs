//! Implementation of the `schedlock lock` commands.
//!
//! Both commands are read-only views of the lock table.

use crate::cli::{LockListArgs, LockShowArgs};
use crate::config::Config;
use crate::duration::format_duration;
use crate::error::{Result, SchedLockError};
use crate::locks::{LockInfo, describe_lock, list_locks, open_store};
use chrono::Utc;
use std::path::Path;

pub fn cmd_lock_list(config_path: &Path, args: LockListArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let store = open_store(&config.store)?;
    let locks = list_locks(store.as_ref(), Utc::now())?;

    if args.json {
        let json = serde_json::to_string_pretty(&locks).map_err(|e| {
            SchedLockError::UserError(format!("failed to serialize locks: {}", e))
        })?;
        println!("{}", json);
        return Ok(());
    }

    if locks.is_empty() {
        println!("No locks recorded.");
        return Ok(());
    }

    println!("Locks ({}):", locks.len());
    println!();
    for lock in &locks {
        print_lock(lock);
    }

    let held = locks.iter().filter(|l| l.held).count();
    println!("{} held, {} free.", held, locks.len() - held);
    Ok(())
}

pub fn cmd_lock_show(config_path: &Path, args: LockShowArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let store = open_store(&config.store)?;
    let lock = describe_lock(store.as_ref(), &args.name, Utc::now())?;
    print_lock(&lock);
    Ok(())
}

fn print_lock(lock: &LockInfo) {
    println!("  {}:", lock.record.name);
    println!("    Holder:     {}", lock.record.locked_by);
    println!(
        "    Locked at:  {}",
        lock.record.locked_at.format("%Y-%m-%d %H:%M:%S%.3f UTC")
    );
    println!(
        "    Until:      {}",
        lock.record.locked_until.format("%Y-%m-%d %H:%M:%S%.3f UTC")
    );
    if lock.held {
        println!("    Status:     HELD ({} left)", format_duration(lock.remaining));
    } else {
        println!("    Status:     free");
    }
    println!();
}
