// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! appvol - per-application volume control panel for PulseAudio.
//!
//! Without arguments the panel is shown. With arguments a command is run
//! against the active stream, in the running panel if there is one.

mod app;
mod audio;
mod command;
mod config;
mod message;
mod single_instance;
mod state;
mod streams;
mod ui;

use app::AppVol;
use appvol_ipc::CommandReply;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> iced::Result {
    // Logs go to stderr; stdout is reserved for command output.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,appvol=debug,zbus=warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // A running panel handles everything, including a bare "show".
    if let Some(reply) = single_instance::try_forward(&args) {
        finish(&reply);
    }

    if !args.is_empty() {
        let config = config::load_or_default();
        let reply = audio::run_headless(&args, &config.session);
        finish(&reply);
    }

    info!("Starting appvol panel");

    // Run as daemon so hiding the window doesn't exit the app
    iced::daemon(AppVol::new, AppVol::update, AppVol::view)
        .title(AppVol::title)
        .subscription(AppVol::subscription)
        .theme(AppVol::theme)
        .run()
}

/// Print a command reply and exit with its code.
fn finish(reply: &CommandReply) -> ! {
    if !reply.output.is_empty() {
        if reply.is_success() {
            println!("{}", reply.output);
        } else {
            eprintln!("{}", reply.output);
        }
    }
    std::process::exit(reply.exit_code)
}
