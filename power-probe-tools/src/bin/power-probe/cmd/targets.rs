use anyhow::Result;
use colored::Colorize;
use power_probe::{Session, TargetStatus};

#[derive(clap::Parser)]
pub struct Cmd {}

impl Cmd {
    pub fn run(&self, session: &Session) -> Result<usize> {
        let tree = session.tree();
        let mut total = 0;

        for class in tree.class_names() {
            if class == "root" {
                continue;
            }
            let members = tree
                .members_of_class(class)
                .map(<[_]>::to_vec)
                .unwrap_or_default();
            let mut enabled = 0;
            for &member in &members {
                if tree.status(member)? == TargetStatus::Enabled {
                    enabled += 1;
                }
            }
            println!(
                "{}: {enabled} of {} enabled",
                class.bold(),
                members.len()
            );
            total += enabled;
        }

        Ok(total)
    }
}
