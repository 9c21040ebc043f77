//! Human-readable policy summaries printed to stdout.

use std::collections::BTreeSet;

use opm_core::{PolicyItem, SourcePolicy, TargetPolicy};

const BAR: &str = "================================================================================";

/// Print a titled summary of source policies.
pub fn display_source_policies(policies: &[SourcePolicy], title: &str) {
    print_header(title, policies.len());
    for (index, policy) in policies.iter().enumerate() {
        println!("{}. Policy Name: {}", index + 1, policy.name);
        println!("   Service: {}", policy.service);
        for (kind, label) in [
            ("database", "Database(s)"),
            ("table", "Table(s)"),
            ("url", "URL(s)"),
            ("path", "Path(s)"),
        ] {
            print_values(label, policy.resource_values(kind));
        }
        print_principals(&policy.policy_items);
        println!();
    }
}

/// Print a titled summary of target policies.
pub fn display_target_policies(policies: &[TargetPolicy], title: &str) {
    print_header(title, policies.len());
    for (index, policy) in policies.iter().enumerate() {
        println!("{}. Policy Name: {}", index + 1, policy.name);
        println!("   Service: {}", policy.service);
        print_values("Volume", &policy.resources.volume.values);
        if let Some(bucket) = &policy.resources.bucket {
            print_values("Bucket", &bucket.values);
        }
        if let Some(key) = &policy.resources.key {
            print_values("Key", &key.values);
        }
        print_principals(&policy.policy_items);
        println!();
    }
}

fn print_header(title: &str, count: usize) {
    println!("\n{BAR}");
    println!("{title}");
    println!("{BAR}");
    println!("Total policies: {count}\n");
}

fn print_values(label: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    // Long value lists are truncated; the JSON reports carry everything.
    let shown: Vec<&str> = values.iter().take(2).map(String::as_str).collect();
    println!("   {label}: {}", shown.join(", "));
    if values.len() > 2 {
        println!("            ... and {} more", values.len() - 2);
    }
}

fn print_principals(items: &[PolicyItem]) {
    let users: BTreeSet<&str> = items
        .iter()
        .flat_map(|item| item.users.iter().map(String::as_str))
        .collect();
    let groups: BTreeSet<&str> = items
        .iter()
        .flat_map(|item| item.groups.iter().map(String::as_str))
        .collect();
    if !groups.is_empty() {
        println!("   Groups: {}", groups.into_iter().collect::<Vec<_>>().join(", "));
    }
    if !users.is_empty() {
        println!("   Users: {}", users.into_iter().collect::<Vec<_>>().join(", "));
    }
}
