// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) wires configuration, logging and the API client together and
// hands them to the interactive UI.
//
// Module responsibilities:
// - `model`: Modes, listing records and the upload form.
// - `api`: The `LibraryApi` seam and its HTTP implementation (list, upload,
//   delete, download).
// - `view`: Pure view-model: records to cards to a node tree / HTML.
// - `controller`: Load, upload, delete and download flows, per-mode request
//   serialization and the explicit refresh step after mutations.
// - `config`: Defaults, JSON config file and environment overrides.
// - `logging`: tracing subscriber setup.
// - `ui`: The terminal front-end.
pub mod api;
pub mod config;
pub mod controller;
pub mod logging;
pub mod model;
pub mod ui;
pub mod view;
