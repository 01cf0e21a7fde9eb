use anyhow::Result;

use crate::config::Config;
use crate::job::{Job, JobStore};

use super::args::JobsCliArgs;

pub async fn handle_jobs_command(args: JobsCliArgs, config: &Config) -> Result<()> {
    let store = JobStore::open(&config.storage.db_file()?)?;

    if let Some(id) = args.id {
        let job = store.require(&id).await?;
        print_job_detail(&job);
        return Ok(());
    }

    let jobs = store.list(args.limit).await?;
    if jobs.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }

    println!("Found {} job(s):\n", jobs.len());
    for job in jobs {
        println!("ID: {}", job.id);
        println!("File: {}", job.filename);
        println!("Status: {} ({}%)", job.status, job.progress);
        println!("Created: {}", job.status_view().created_at);
        if let Some(error) = &job.error {
            println!("Error: {}", error);
        }
        println!("---");
    }

    println!("\nTo see a job in detail, use: minutes jobs --id <ID>");
    Ok(())
}

fn print_job_detail(job: &Job) {
    let view = job.status_view();
    println!("ID: {}", view.job_id);
    println!("File: {}", job.filename);
    println!("Stored at: {}", job.file_path);
    println!("Status: {} - {} ({}%)", view.status, view.current_stage, view.progress);
    println!("Created: {}", view.created_at);
    if let Some(completed_at) = &view.completed_at {
        println!("Completed: {}", completed_at);
    }
    if let Some(error) = &view.error {
        println!("Error: {}", error);
    }

    let Ok(summary) = job.summary_view() else {
        return;
    };

    println!("\nSummary:\n{}", summary.summary);
    print_list("Action items", &summary.action_items);
    print_list("Decisions", &summary.decisions);
    print_list("Participants", &summary.participants);
}

fn print_list(title: &str, items: &[String]) {
    println!("\n{}:", title);
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        println!("  - {}", item);
    }
}
