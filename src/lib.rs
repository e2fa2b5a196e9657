// src/lib.rs
pub mod app;
pub mod config;
pub mod episode;
pub mod episode_download;
pub mod episode_factory;
pub mod errors;
pub mod event;
pub mod playback;
pub mod player;
pub mod ui;

pub mod widgets;
