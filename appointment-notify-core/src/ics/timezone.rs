//! VTIMEZONE definitions embedded in invites.
//!
//! The server ships an iCalendar file with the VTIMEZONE components of the
//! zones it uses. Invites carry the definition of the configured zone so
//! clients do not have to guess what a TZID means.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use icalendar::parser::{read_calendar, unfold};
use tracing::debug;

use crate::error::{NotifyError, NotifyResult};

/// Anything able to provide the time-zone definitions.
pub trait TimeZoneSource: Send + Sync {
    fn load(&self) -> NotifyResult<TimeZoneRegistry>;
}

/// Time-zone definitions keyed by TZID.
#[derive(Debug, Clone, Default)]
pub struct TimeZoneRegistry {
    zones: HashMap<String, Vec<String>>,
}

impl TimeZoneRegistry {
    /// Parse an iCalendar document and collect its VTIMEZONE components.
    pub fn parse(content: &str) -> NotifyResult<Self> {
        let unfolded = unfold(content);
        let calendar = read_calendar(&unfolded)
            .map_err(|e| NotifyError::Format(format!("Invalid time zone calendar: {e}")))?;

        let declared: Vec<String> = calendar
            .components
            .iter()
            .filter(|c| c.name == "VTIMEZONE")
            .filter_map(|c| c.find_prop("TZID").map(|p| p.val.to_string()))
            .collect();

        let zones = collect_vtimezone_blocks(&unfolded);

        if zones.is_empty() {
            return Err(NotifyError::Format(
                "No VTIMEZONE definition found".to_string(),
            ));
        }
        if let Some(missing) = declared.iter().find(|tzid| !zones.contains_key(*tzid)) {
            return Err(NotifyError::Format(format!(
                "VTIMEZONE '{missing}' could not be extracted"
            )));
        }

        Ok(TimeZoneRegistry { zones })
    }

    /// Content lines (unfolded, without line endings) of a zone definition,
    /// from BEGIN:VTIMEZONE to END:VTIMEZONE.
    pub fn definition(&self, tzid: &str) -> Option<&[String]> {
        self.zones.get(tzid).map(Vec::as_slice)
    }

    pub fn contains(&self, tzid: &str) -> bool {
        self.zones.contains_key(tzid)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl TimeZoneSource for TimeZoneRegistry {
    fn load(&self) -> NotifyResult<TimeZoneRegistry> {
        Ok(self.clone())
    }
}

/// Reads the definitions file on every load.
#[derive(Debug, Clone)]
pub struct FileTimeZoneSource {
    path: PathBuf,
}

impl FileTimeZoneSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTimeZoneSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TimeZoneSource for FileTimeZoneSource {
    fn load(&self) -> NotifyResult<TimeZoneRegistry> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| NotifyError::ResourceUnavailable {
                path: self.path.clone(),
                source,
            })?;

        let registry = TimeZoneRegistry::parse(&content).map_err(|e| match e {
            NotifyError::Format(msg) => {
                NotifyError::Format(format!("{}: {msg}", self.path.display()))
            }
            other => other,
        })?;

        debug!(
            path = %self.path.display(),
            zones = registry.len(),
            "Loaded time zone definitions"
        );
        Ok(registry)
    }
}

/// Split unfolded iCalendar text into VTIMEZONE blocks keyed by TZID.
fn collect_vtimezone_blocks(unfolded: &str) -> HashMap<String, Vec<String>> {
    let mut zones = HashMap::new();
    let mut current: Option<Vec<String>> = None;
    let mut tzid: Option<String> = None;
    let mut depth = 0;

    for line in unfolded.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        if line == "BEGIN:VTIMEZONE" && current.is_none() {
            current = Some(vec![line.to_string()]);
            depth = 0;
            continue;
        }

        let Some(block) = current.as_mut() else {
            continue;
        };
        block.push(line.to_string());

        if line.starts_with("BEGIN:") {
            depth += 1;
        } else if line.starts_with("END:") && depth > 0 {
            depth -= 1;
        } else if line == "END:VTIMEZONE" {
            if let (Some(id), Some(done)) = (tzid.take(), current.take()) {
                zones.insert(id, done);
            }
        } else if depth == 0 {
            if let Some(id) = line.strip_prefix("TZID:") {
                tzid = Some(id.to_string());
            }
        }
    }

    zones
}
