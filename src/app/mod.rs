// Application layer: concrete pipelines wiring config and storage to the core stages.

pub mod pipelines;
