//! The intermediate snapshot file: every enrichment result accumulated
//! across runs, keyed by gym id. Read at startup, rewritten after each gym,
//! so a crashed run resumes with its partial work intact.

use std::fs;
use std::path::Path;

use anyhow::Context;

use matfinder_core::types::GymEnrichmentResult;

/// Loads the snapshot. An absent file is an empty snapshot, not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> anyhow::Result<Vec<GymEnrichmentResult>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let results = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    Ok(results)
}

/// Merges this run's results into the previous snapshot.
///
/// New results replace old entries with the same gym id in place; gyms not
/// re-scraped keep their previous entry; genuinely new gyms are appended in
/// id order.
#[must_use]
pub fn merge(
    mut previous: Vec<GymEnrichmentResult>,
    new: Vec<GymEnrichmentResult>,
) -> Vec<GymEnrichmentResult> {
    let mut fresh: std::collections::HashMap<i64, GymEnrichmentResult> =
        new.into_iter().map(|r| (r.gym_id, r)).collect();

    for entry in &mut previous {
        if let Some(replacement) = fresh.remove(&entry.gym_id) {
            *entry = replacement;
        }
    }

    let mut added: Vec<GymEnrichmentResult> = fresh.into_values().collect();
    added.sort_by_key(|r| r.gym_id);
    previous.extend(added);
    previous
}

/// Writes the snapshot atomically: temp file in the same directory, then
/// rename over the old file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot
/// be written or renamed.
pub fn write(path: &Path, results: &[GymEnrichmentResult]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating snapshot directory {}", parent.display()))?;
        }
    }

    let serialized = serde_json::to_string_pretty(results).context("serializing snapshot")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serialized)
        .with_context(|| format!("writing snapshot temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("replacing snapshot {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use matfinder_core::types::GymSeed;

    use super::*;

    fn result(id: i64, email: &str) -> GymEnrichmentResult {
        let seed = GymSeed {
            id,
            name: format!("Gym {id}"),
            website: None,
            borough: None,
        };
        let mut r = GymEnrichmentResult::empty(&seed);
        if !email.is_empty() {
            r.contacts.emails.push(email.to_owned());
        }
        r
    }

    #[test]
    fn load_returns_empty_for_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        write(&path, &[result(1, "a@gym.com"), result(2, "")]).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].gym_id, 1);
        assert_eq!(loaded[0].contacts.emails, vec!["a@gym.com"]);
    }

    #[test]
    fn write_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/snapshot.json");
        write(&path, &[result(1, "a@gym.com")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn merge_replaces_rescraped_and_preserves_the_rest() {
        let previous = vec![result(1, "old-a@gym.com"), result(2, "old-b@gym.com")];
        let new = vec![result(2, "new-b@gym.com")];

        let merged = merge(previous, new);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].gym_id, 1);
        assert_eq!(merged[0].contacts.emails, vec!["old-a@gym.com"]);
        assert_eq!(merged[1].gym_id, 2);
        assert_eq!(merged[1].contacts.emails, vec!["new-b@gym.com"]);
    }

    #[test]
    fn merge_appends_new_gyms_in_id_order() {
        let previous = vec![result(5, "e@gym.com")];
        let new = vec![result(9, "i@gym.com"), result(7, "g@gym.com")];

        let merged = merge(previous, new);

        let ids: Vec<i64> = merged.iter().map(|r| r.gym_id).collect();
        assert_eq!(ids, vec![5, 7, 9]);
    }

    #[test]
    fn merge_of_empty_run_is_a_no_op() {
        let previous = vec![result(1, "a@gym.com")];
        let merged = merge(previous.clone(), Vec::new());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].gym_id, previous[0].gym_id);
    }

    #[test]
    fn corrupt_snapshot_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load(&path).is_err());
    }
}
