//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `quill_core` linkage and print deterministic probe lines.
//! - With a database path argument, migrate it and print row counts.
//!
//! Logging starts when `QUILL_LOG_DIR` is set; `QUILL_LOG_LEVEL` picks the
//! level.

use log::{error, info};
use quill_core::logging::LoggingConfig;
use quill_core::{
    init_logging, open_db, BlogService, PostRepository, RequestParams, TagRepository,
    UserRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = LoggingConfig::from_env();
    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.level, log_dir) {
            eprintln!("quill: logging disabled: {err}");
        }
    }

    println!("quill_core ping={}", quill_core::ping());
    println!("quill_core version={}", quill_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    match report(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_report module=cli status=error error={err}");
            eprintln!("quill: {err}");
            ExitCode::FAILURE
        }
    }
}

fn report(db_path: &str) -> Result<(), Box<dyn Error>> {
    let conn = open_db(db_path)?;
    let mut posts = PostRepository::try_new(&conn)?;
    let total_posts = posts.skip_criteria(true).count()?;
    let published = BlogService::new(&conn).index(1)?.total;
    let tags = TagRepository::try_new(&conn, &RequestParams::new())?.count()?;
    let users = UserRepository::try_new(&conn)?.count()?;

    info!("event=cli_report module=cli status=ok posts={total_posts} tags={tags} users={users}");
    println!("posts={total_posts} published={published} tags={tags} users={users}");
    Ok(())
}
