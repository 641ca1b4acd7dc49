//! Pipeline input tree
//!
//! An input is either a data source leaf or a structural operator combining
//! child inputs. Leaves name a source symbolically by repository and branch;
//! once a job is admitted each leaf is additionally pinned to a commit.

use serde::{Deserialize, Serialize};

/// Node of a pipeline's input tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Input {
    /// Branch-tracked repository
    Pfs(PfsInput),
    /// Time-triggered source
    Cron(CronInput),
    /// Externally hosted git repository
    Git(GitInput),
    /// Cross product of the children
    Cross(Vec<Input>),
    /// Union of the children
    Union(Vec<Input>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PfsInput {
    pub name: String,
    pub repo: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub glob: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CronInput {
    pub name: String,
    pub repo: String,
    /// Declared branch; cron ticks are always committed to `master`
    #[serde(default)]
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub spec: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitInput {
    /// Also the name of the repository the git commits are mirrored into
    pub name: String,
    pub url: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl Input {
    /// Calls `f` on this node and then on every descendant, depth first
    pub fn visit_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Input),
    {
        f(self);
        match self {
            Input::Cross(children) | Input::Union(children) => {
                for child in children {
                    child.visit_mut(f);
                }
            }
            Input::Pfs(_) | Input::Cron(_) | Input::Git(_) => {}
        }
    }

    /// Calls `f` on this node and then on every descendant, depth first
    pub fn visit<F>(&self, f: &mut F)
    where
        F: FnMut(&Input),
    {
        f(self);
        match self {
            Input::Cross(children) | Input::Union(children) => {
                for child in children {
                    child.visit(f);
                }
            }
            Input::Pfs(_) | Input::Cron(_) | Input::Git(_) => {}
        }
    }
}

/// One upstream commit that causally produced an output commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitProvenance {
    pub commit: String,
    pub repo: String,
    pub branch: String,
}

impl CommitProvenance {
    pub fn new(
        commit: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            commit: commit.into(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfs(repo: &str) -> Input {
        Input::Pfs(PfsInput {
            repo: repo.to_string(),
            branch: "master".to_string(),
            glob: "/*".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_visit_reaches_nested_leaves() {
        let input = Input::Cross(vec![pfs("a"), Input::Union(vec![pfs("b"), pfs("c")])]);

        let mut repos = Vec::new();
        input.visit(&mut |node| {
            if let Input::Pfs(leaf) = node {
                repos.push(leaf.repo.clone());
            }
        });

        assert_eq!(repos, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_input_json_shape() {
        let value = serde_json::to_value(pfs("images")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "pfs": { "name": "", "repo": "images", "branch": "master", "glob": "/*" }
            })
        );
    }
}
