use crate::error::Error;
use crate::hosts::HostRecord;
use crate::manager::ConnectionManager;
use crate::runner;

/// Remote listing command. The embedded `\t` are literal tabs inside the
/// format string, which is what the parser splits on.
pub const LIST_COMMAND: &str =
    "docker ps --format '{{.ID}}\t{{.Names}}\t{{.Image}}\t{{.Status}}'";

/// One container as reported by a single listing call. The whole snapshot is
/// replaced on the next listing; records are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
}

/// List the containers running on `host`, reusing (or creating) its managed
/// connection.
pub fn list_containers(
    manager: &ConnectionManager,
    host: &HostRecord,
) -> Result<Vec<ContainerRecord>, Error> {
    let session = manager.connect(host)?;
    let raw = runner::run(&session, LIST_COMMAND)?;
    Ok(parse_listing(&raw))
}

/// Parse `docker ps` tab-separated output, one container per line.
///
/// Tolerant: a line with fewer than four fields is dropped rather than
/// failing the whole listing. Zero containers is an empty vec, not an error.
pub fn parse_listing(raw: &str) -> Vec<ContainerRecord> {
    raw.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 4 {
                return None;
            }
            Some(ContainerRecord {
                id: fields[0].to_string(),
                name: fields[1].to_string(),
                image: fields[2].to_string(),
                status: fields[3].to_string(),
            })
        })
        .collect()
}

/// Interactive exec command for a container, with a plain-shell fallback for
/// images that don't ship bash.
pub fn exec_command(container_id: &str) -> String {
    format!("docker exec -it {container_id} bash || docker exec -it {container_id} sh")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_line() {
        let records = parse_listing("abc123\tweb\tnginx:latest\tUp 2 minutes\n");
        assert_eq!(
            records,
            vec![ContainerRecord {
                id: "abc123".into(),
                name: "web".into(),
                image: "nginx:latest".into(),
                status: "Up 2 minutes".into(),
            }]
        );
    }

    #[test]
    fn test_parse_skips_short_lines() {
        let raw = "abc123\tweb\nrest\tdb\tpostgres:16\tUp 3 days\n";
        let records = parse_listing(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "db");
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_listing("").is_empty());
        assert!(parse_listing("\n").is_empty());
    }

    #[test]
    fn test_parse_multiple_lines() {
        let raw = "a\tone\timg:1\tUp\nb\ttwo\timg:2\tExited (0) 5 hours ago\n";
        let records = parse_listing(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].status, "Exited (0) 5 hours ago");
    }

    #[test]
    fn test_list_command_embeds_tabs() {
        assert_eq!(LIST_COMMAND.matches('\t').count(), 3);
    }

    #[test]
    fn test_exec_command_has_sh_fallback() {
        let cmd = exec_command("abc123");
        assert_eq!(
            cmd,
            "docker exec -it abc123 bash || docker exec -it abc123 sh"
        );
    }
}
