use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub expanded_nodes: usize,
    pub generated_nodes: usize,
    pub time_us: u128,
}
