//! Process Graph Model - Caller-Owned Input
//!
//! The serializer only ever borrows these values.

use serde::{Deserialize, Deserializer, Serialize};

pub type NodeId = String;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGraph {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub process_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lanes: Vec<Lane>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nodes: Vec<Node>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub flows: Vec<Flow>,
}

impl ProcessGraph {
    /// Process id, or `default` when the graph carries none.
    pub fn resolved_process_id<'a>(&'a self, default: &'a str) -> &'a str {
        present(&self.process_id).unwrap_or(default)
    }

    /// Process name, falling back to the resolved process id.
    pub fn resolved_name<'a>(&'a self, default_process_id: &'a str) -> &'a str {
        present(&self.name).unwrap_or_else(|| self.resolved_process_id(default_process_id))
    }

    pub fn title(&self) -> Option<&str> {
        present(&self.title)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lane {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Lane {
    pub fn name(&self) -> Option<&str> {
        present(&self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: NodeId,
    /// Free-form type tag, e.g. `startEvent` or `userTask`.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub node_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lane_id: Option<String>,
}

impl Node {
    pub fn name(&self) -> Option<&str> {
        present(&self.name)
    }

    pub fn lane_id(&self) -> Option<&str> {
        present(&self.lane_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flow {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: NodeId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target: NodeId,
    #[serde(default)]
    pub name: Option<String>,
}

impl Flow {
    pub fn name(&self) -> Option<&str> {
        present(&self.name)
    }

    /// Both endpoints are set. Says nothing about whether they resolve.
    pub fn is_connected(&self) -> bool {
        !self.source.is_empty() && !self.target.is_empty()
    }
}

/// Empty optional strings are treated as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
