//! Job input resolution
//!
//! A job must read exactly the upstream commits that caused its output commit,
//! not whatever its input branches point at when it happens to run. Resolution
//! pins every leaf of the pipeline's input tree to the commit recorded in the
//! output commit's provenance.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::input::{CommitProvenance, CronInput, GitInput, Input, PfsInput};

/// Branch that cron inputs commit their ticks to
const CRON_BRANCH: &str = "master";

fn branch_key(repo: &str, branch: &str) -> String {
    format!("{}/{}", repo, branch)
}

/// Returns a copy of `template` with every leaf pinned to its provenance commit
///
/// Leaves whose `(repo, branch)` does not appear in `provenance` are left
/// unresolved. If the provenance lists the same branch twice, the later entry
/// wins. `template` is never modified.
pub fn resolve_job_input(template: &Input, provenance: &[CommitProvenance]) -> Input {
    let branch_to_commit: HashMap<String, &str> = provenance
        .iter()
        .map(|prov| (branch_key(&prov.repo, &prov.branch), prov.commit.as_str()))
        .collect();

    let mut input = template.clone();
    input.visit_mut(&mut |node| {
        let (repo, branch, commit) = match node {
            Input::Pfs(PfsInput {
                repo,
                branch,
                commit,
                ..
            }) => (repo.as_str(), branch.as_str(), commit),
            Input::Cron(CronInput { repo, commit, .. }) => (repo.as_str(), CRON_BRANCH, commit),
            Input::Git(GitInput {
                name,
                branch,
                commit,
                ..
            }) => (name.as_str(), branch.as_str(), commit),
            Input::Cross(_) | Input::Union(_) => return,
        };

        match branch_to_commit.get(&branch_key(repo, branch)) {
            Some(found) => *commit = Some((*found).to_string()),
            None => debug!("no provenance for input {}@{}, leaving unresolved", repo, branch),
        }
    });

    input
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfs(repo: &str, branch: &str) -> Input {
        Input::Pfs(PfsInput {
            name: repo.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            commit: None,
            glob: "/*".to_string(),
        })
    }

    fn commit_of(input: &Input) -> Option<&str> {
        match input {
            Input::Pfs(leaf) => leaf.commit.as_deref(),
            Input::Cron(leaf) => leaf.commit.as_deref(),
            Input::Git(leaf) => leaf.commit.as_deref(),
            Input::Cross(_) | Input::Union(_) => None,
        }
    }

    #[test]
    fn test_pfs_leaf_pinned() {
        let template = pfs("A", "master");
        let provenance = vec![CommitProvenance::new("c1", "A", "master")];

        let resolved = resolve_job_input(&template, &provenance);
        assert_eq!(commit_of(&resolved), Some("c1"));
        assert_eq!(commit_of(&template), None);
    }

    #[test]
    fn test_cron_leaf_reads_master() {
        let template = Input::Cron(CronInput {
            name: "tick".to_string(),
            repo: "A".to_string(),
            branch: "ignored".to_string(),
            commit: None,
            spec: "@every 10s".to_string(),
        });
        let provenance = vec![
            CommitProvenance::new("wrong", "A", "ignored"),
            CommitProvenance::new("c2", "A", "master"),
        ];

        let resolved = resolve_job_input(&template, &provenance);
        assert_eq!(commit_of(&resolved), Some("c2"));
    }

    #[test]
    fn test_git_leaf_uses_name() {
        let template = Input::Git(GitInput {
            name: "upstream".to_string(),
            url: "https://example.com/upstream.git".to_string(),
            branch: "main".to_string(),
            commit: None,
        });
        let provenance = vec![CommitProvenance::new("deadbeef", "upstream", "main")];

        let resolved = resolve_job_input(&template, &provenance);
        assert_eq!(commit_of(&resolved), Some("deadbeef"));
    }

    #[test]
    fn test_nested_tree_and_unresolved_leaf() {
        let template = Input::Cross(vec![
            pfs("images", "master"),
            Input::Union(vec![pfs("labels", "dev"), pfs("orphan", "master")]),
        ]);
        let provenance = vec![
            CommitProvenance::new("i1", "images", "master"),
            CommitProvenance::new("l1", "labels", "dev"),
        ];

        let resolved = resolve_job_input(&template, &provenance);

        let mut commits = Vec::new();
        resolved.visit(&mut |node| {
            if let Input::Pfs(leaf) = node {
                commits.push((leaf.repo.clone(), leaf.commit.clone()));
            }
        });
        assert_eq!(
            commits,
            vec![
                ("images".to_string(), Some("i1".to_string())),
                ("labels".to_string(), Some("l1".to_string())),
                ("orphan".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let template = Input::Union(vec![pfs("a", "master"), pfs("b", "master")]);
        let provenance = vec![
            CommitProvenance::new("a1", "a", "master"),
            CommitProvenance::new("b1", "b", "master"),
        ];

        let first = serde_json::to_vec(&resolve_job_input(&template, &provenance)).unwrap();
        let second = serde_json::to_vec(&resolve_job_input(&template, &provenance)).unwrap();
        assert_eq!(first, second);
    }
}
