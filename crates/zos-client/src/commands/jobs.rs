//! The `zos-jobs` command tree: submit JCL, list jobs and spool files,
//! view status and output, download spool content, and cancel, purge,
//! modify, or search jobs.

use crate::config::ResolvedConnection;
use crate::output::{print_json, render_table, OutputFormat};
use clap::{ArgAction, Args, Subcommand};
use miette::{miette, IntoDiagnostic, WrapErr};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use zosmf_jobs::download::{download_all_spool_content, DownloadSpoolOptions};
use zosmf_jobs::get::{
    get_jcl, get_jobs_common, get_spool_content_by_id, get_spool_files, get_status,
    GetJobsOptions,
};
use zosmf_jobs::modify::{cancel_job, delete_job, modify_job, ModifyJobOptions, ModifyVersion};
use zosmf_jobs::search::{search_jobs, SearchOptions, DEFAULT_FILE_LIMIT, DEFAULT_SEARCH_LIMIT};
use zosmf_jobs::submit::{submit_common, SubmitOptions};
use zosmf_jobs::{JclSource, Job, JobFeedback};
use zosmf_sdk::ZosmfSession;

#[derive(Debug, Subcommand)]
pub enum JobsCommand {
    /// Submit a job from JCL held locally or on the mainframe.
    #[command(subcommand)]
    Submit(SubmitCommand),
    /// List jobs or the spool files of a job.
    #[command(subcommand)]
    List(JobsListCommand),
    /// View job status, spool file content, or submitted JCL.
    #[command(subcommand)]
    View(ViewCommand),
    /// Download job output.
    #[command(subcommand)]
    Download(JobsDownloadCommand),
    /// Cancel a job.
    Cancel(JobActionArgs),
    /// Cancel a job and purge its output.
    Delete(JobActionArgs),
    /// Hold, release, or reclass a job.
    Modify(ModifyArgs),
    /// Search spool content for text or a regular expression.
    Search(SearchArgs),
}

pub async fn run(
    connection: &ResolvedConnection,
    format: OutputFormat,
    command: JobsCommand,
) -> miette::Result<()> {
    let session = connection.session()?;
    match command {
        JobsCommand::Submit(command) => submit(&session, format, command).await,
        JobsCommand::List(command) => list(&session, format, command).await,
        JobsCommand::View(command) => view(&session, format, command).await,
        JobsCommand::Download(command) => download(&session, format, command).await,
        JobsCommand::Cancel(args) => {
            let version = parse_modify_version(&args.modify_version)?;
            let feedback = cancel_job(&session, &args.job.jobname, &args.job.jobid, version).await?;
            finish_modify(format, "cancelled", &args.job, feedback)
        }
        JobsCommand::Delete(args) => {
            let version = parse_modify_version(&args.modify_version)?;
            let feedback = delete_job(&session, &args.job.jobname, &args.job.jobid, version).await?;
            finish_modify(format, "purged", &args.job, feedback)
        }
        JobsCommand::Modify(args) => {
            let options = ModifyJobOptions {
                job_class: args.job_class.clone(),
                hold: args.hold,
                release: args.release,
            };
            let feedback =
                modify_job(&session, &args.job.jobname, &args.job.jobid, &options).await?;
            finish_modify(format, "modified", &args.job, feedback)
        }
        JobsCommand::Search(args) => search(&session, format, args).await,
    }
}

/// Name and ID naming one job, as most leaf commands take them.
#[derive(Debug, Clone, Args)]
pub struct JobIdentifierArgs {
    /// Name of the job.
    #[arg(value_name = "JOBNAME")]
    pub jobname: String,
    /// JES job ID, such as JOB00123.
    #[arg(value_name = "JOBID")]
    pub jobid: String,
}

fn parse_modify_version(value: &str) -> miette::Result<ModifyVersion> {
    match value {
        "1.0" => Ok(ModifyVersion::V1),
        "2.0" => Ok(ModifyVersion::V2),
        other => Err(miette!("unknown modify version '{other}'; use 1.0 or 2.0")),
    }
}

/// Render the outcome of a cancel, purge, or modify request. Feedback
/// is only present when the synchronous interface version was used.
fn finish_modify(
    format: OutputFormat,
    action: &str,
    job: &JobIdentifierArgs,
    feedback: Option<JobFeedback>,
) -> miette::Result<()> {
    if format.is_json() {
        return print_json(&serde_json::json!({
            "success": true,
            "jobname": job.jobname,
            "jobid": job.jobid,
            "feedback": feedback,
        }));
    }
    println!("Job {}({}) {action}.", job.jobname, job.jobid);
    if let Some(feedback) = feedback {
        println!(
            "Status: {}  internal code: {}  message: {}",
            feedback.status, feedback.internal_code, feedback.message
        );
    }
    Ok(())
}

fn render_job(job: &Job) {
    println!("jobname: {}", job.jobname);
    println!("jobid:   {}", job.jobid);
    println!("owner:   {}", job.owner);
    println!("status:  {}", job.status.as_deref().unwrap_or("-"));
    println!("type:    {}", job.job_type);
    println!("class:   {}", job.class);
    println!("retcode: {}", job.retcode.as_deref().unwrap_or("-"));
}

// ---------------------------------------------------------------------------
// submit

#[derive(Debug, Subcommand)]
pub enum SubmitCommand {
    /// Submit JCL held in a cataloged data set or member.
    #[command(visible_alias = "ds")]
    DataSet {
        /// Data set or member holding the JCL.
        #[arg(value_name = "DSNAME")]
        data_set: String,
        #[command(flatten)]
        options: SubmitArgs,
    },
    /// Submit JCL held in a local file.
    #[command(visible_alias = "lf")]
    LocalFile {
        /// Local file holding the JCL.
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        options: SubmitArgs,
    },
    /// Submit JCL held in a USS file.
    #[command(visible_alias = "uf")]
    UssFile {
        /// USS file holding the JCL.
        #[arg(value_name = "PATH")]
        path: String,
        #[command(flatten)]
        options: SubmitArgs,
    },
    /// Submit JCL read from standard input.
    Stdin {
        #[command(flatten)]
        options: SubmitArgs,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct SubmitArgs {
    /// Wait until the job enters ACTIVE status.
    #[arg(long, conflicts_with = "wait_for_output")]
    pub wait_for_active: bool,
    /// Wait until the job enters OUTPUT status.
    #[arg(long)]
    pub wait_for_output: bool,
    /// Wait for OUTPUT, then print every spool file.
    #[arg(long)]
    pub view_all_spool_content: bool,
    /// Wait for OUTPUT, then download all spool content into this
    /// directory.
    #[arg(short = 'd', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,
    /// Extension for downloaded spool files.
    #[arg(short = 'e', long, value_name = "EXT", requires = "directory")]
    pub extension: Option<String>,
    /// JCL symbol definitions, NAME=value pairs separated by blanks.
    #[arg(long, value_name = "SYMBOLS")]
    pub jcl_symbols: Option<String>,
    /// Internal reader record length for inline JCL.
    #[arg(long, value_name = "LRECL")]
    pub internal_reader_lrecl: Option<String>,
    /// Internal reader record format for inline JCL, F or V.
    #[arg(long, value_name = "RECFM")]
    pub internal_reader_recfm: Option<String>,
    /// Seconds between status polls while waiting.
    #[arg(long, value_name = "SECONDS")]
    pub watch_delay: Option<u64>,
}

impl SubmitArgs {
    fn options(&self) -> SubmitOptions {
        SubmitOptions {
            jcl_symbols: self.jcl_symbols.clone(),
            internal_reader_lrecl: self.internal_reader_lrecl.clone(),
            internal_reader_recfm: self.internal_reader_recfm.clone(),
            wait_for_active: self.wait_for_active,
            wait_for_output: self.wait_for_output,
            view_all_spool_content: self.view_all_spool_content,
            spool_download_dir: self.directory.clone(),
            spool_extension: self.extension.clone(),
            watch_delay: self.watch_delay.map(Duration::from_secs),
        }
    }
}

async fn submit(
    session: &ZosmfSession,
    format: OutputFormat,
    command: SubmitCommand,
) -> miette::Result<()> {
    let (source, args) = match command {
        SubmitCommand::DataSet { data_set, options } => (JclSource::Dataset(data_set), options),
        SubmitCommand::LocalFile { file, options } => (JclSource::LocalFile(file), options),
        SubmitCommand::UssFile { path, options } => (JclSource::UssFile(path), options),
        SubmitCommand::Stdin { options } => {
            let mut jcl = String::new();
            std::io::stdin()
                .read_to_string(&mut jcl)
                .into_diagnostic()
                .wrap_err("could not read JCL from standard input")?;
            (JclSource::Jcl(jcl), options)
        }
    };
    let outcome = submit_common(session, &source, &args.options()).await?;
    if format.is_json() {
        return print_json(&outcome);
    }
    render_job(&outcome.job);
    if let Some(spool) = &outcome.spool {
        for file in spool {
            println!();
            println!("Spool file: {} (ID #{})", file.ddname, file.id);
            println!("{}", file.data);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// list

#[derive(Debug, Subcommand)]
pub enum JobsListCommand {
    /// List jobs by owner, prefix, or job ID.
    Jobs(ListJobsArgs),
    /// List the spool files of a job.
    #[command(visible_alias = "sfs")]
    SpoolFiles(JobIdentifierArgs),
}

#[derive(Debug, Args)]
pub struct ListJobsArgs {
    /// Owner to filter on; defaults to the authenticated user.
    #[arg(short, long, value_name = "OWNER")]
    pub owner: Option<String>,
    /// Job name prefix to filter on, wildcards allowed.
    #[arg(short, long, value_name = "PREFIX")]
    pub prefix: Option<String>,
    /// Most jobs to return.
    #[arg(long, value_name = "N")]
    pub max_jobs: Option<u32>,
    /// Only the job with this ID.
    #[arg(long, value_name = "JOBID")]
    pub jobid: Option<String>,
    /// Include execution data for each job.
    #[arg(long)]
    pub exec_data: bool,
    /// Only jobs in this status: input, active, or output.
    #[arg(long, value_name = "STATUS")]
    pub status: Option<String>,
}

fn job_rows(jobs: &[Job]) -> Vec<Vec<String>> {
    jobs.iter()
        .map(|job| {
            vec![
                job.jobid.clone(),
                job.jobname.clone(),
                job.owner.clone(),
                job.status.clone().unwrap_or_else(|| "-".into()),
                job.class.clone(),
                job.retcode.clone().unwrap_or_else(|| "-".into()),
            ]
        })
        .collect()
}

async fn list(
    session: &ZosmfSession,
    format: OutputFormat,
    command: JobsListCommand,
) -> miette::Result<()> {
    match command {
        JobsListCommand::Jobs(args) => {
            let options = GetJobsOptions {
                owner: args.owner.clone(),
                prefix: args.prefix.clone(),
                max_jobs: args.max_jobs,
                jobid: args.jobid.clone(),
                exec_data: args.exec_data,
                status: args.status.clone(),
            };
            let jobs = get_jobs_common(session, &options).await?;
            if format.is_json() {
                return print_json(&jobs);
            }
            print!(
                "{}",
                render_table(
                    &["JOBID", "JOBNAME", "OWNER", "STATUS", "CLASS", "RETCODE"],
                    &job_rows(&jobs),
                )
            );
            Ok(())
        }
        JobsListCommand::SpoolFiles(args) => {
            let files = get_spool_files(session, &args.jobname, &args.jobid).await?;
            if format.is_json() {
                return print_json(&files);
            }
            let rows: Vec<Vec<String>> = files
                .iter()
                .map(|file| {
                    vec![
                        file.id.to_string(),
                        file.ddname.clone(),
                        file.stepname.clone().unwrap_or_else(|| "-".into()),
                        file.procstep.clone().unwrap_or_else(|| "-".into()),
                        file.recfm.clone(),
                        file.lrecl.to_string(),
                        file.byte_count.to_string(),
                    ]
                })
                .collect();
            print!(
                "{}",
                render_table(
                    &["ID", "DDNAME", "STEPNAME", "PROCSTEP", "RECFM", "LRECL", "BYTES"],
                    &rows,
                )
            );
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// view

#[derive(Debug, Subcommand)]
pub enum ViewCommand {
    /// View the status and completion fields of a job.
    #[command(visible_alias = "status")]
    JobStatus(JobIdentifierArgs),
    /// Print the content of one spool file.
    #[command(visible_alias = "sf")]
    SpoolFile(ViewSpoolFileArgs),
    /// Print the JCL the job was submitted with.
    Jcl(JobIdentifierArgs),
}

#[derive(Debug, Args)]
pub struct ViewSpoolFileArgs {
    #[command(flatten)]
    pub job: JobIdentifierArgs,
    /// Spool file ID from the spool file listing.
    #[arg(value_name = "ID")]
    pub id: i64,
}

async fn view(
    session: &ZosmfSession,
    format: OutputFormat,
    command: ViewCommand,
) -> miette::Result<()> {
    match command {
        ViewCommand::JobStatus(args) => {
            let job = get_status(session, &args.jobname, &args.jobid).await?;
            if format.is_json() {
                return print_json(&job);
            }
            render_job(&job);
            Ok(())
        }
        ViewCommand::SpoolFile(args) => {
            let content =
                get_spool_content_by_id(session, &args.job.jobname, &args.job.jobid, args.id)
                    .await?;
            if format.is_json() {
                return print_json(&serde_json::json!({
                    "jobname": args.job.jobname,
                    "jobid": args.job.jobid,
                    "id": args.id,
                    "data": content,
                }));
            }
            print!("{content}");
            Ok(())
        }
        ViewCommand::Jcl(args) => {
            let jcl = get_jcl(session, &args.jobname, &args.jobid).await?;
            if format.is_json() {
                return print_json(&serde_json::json!({
                    "jobname": args.jobname,
                    "jobid": args.jobid,
                    "jcl": jcl,
                }));
            }
            print!("{jcl}");
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// download

#[derive(Debug, Subcommand)]
pub enum JobsDownloadCommand {
    /// Download all spool files of a job.
    #[command(visible_alias = "o")]
    Output(DownloadOutputArgs),
}

#[derive(Debug, Args)]
pub struct DownloadOutputArgs {
    #[command(flatten)]
    pub job: JobIdentifierArgs,
    /// Local directory to download into.
    #[arg(short = 'd', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,
    /// Skip the per-jobid directory level.
    #[arg(long)]
    pub omit_jobid_directory: bool,
    /// Extension for the downloaded files.
    #[arg(short = 'e', long, value_name = "EXT")]
    pub extension: Option<String>,
    /// Transfer the content as raw bytes.
    #[arg(long, conflicts_with = "record")]
    pub binary: bool,
    /// Transfer the content in record mode.
    #[arg(long)]
    pub record: bool,
    /// Remote codepage for text transfers.
    #[arg(long, value_name = "CODEPAGE")]
    pub encoding: Option<String>,
    /// Record subrange to fetch, formatted x-y.
    #[arg(long, value_name = "RANGE")]
    pub record_range: Option<String>,
}

async fn download(
    session: &ZosmfSession,
    format: OutputFormat,
    command: JobsDownloadCommand,
) -> miette::Result<()> {
    match command {
        JobsDownloadCommand::Output(args) => {
            let options = DownloadSpoolOptions {
                out_dir: args.directory.clone(),
                omit_jobid_directory: args.omit_jobid_directory,
                extension: args.extension.clone(),
                binary: args.binary,
                record: args.record,
                encoding: args.encoding.clone(),
                record_range: args.record_range.clone(),
            };
            let downloaded =
                download_all_spool_content(session, &args.job.jobname, &args.job.jobid, &options)
                    .await?;
            if format.is_json() {
                return print_json(&serde_json::json!({
                    "jobname": args.job.jobname,
                    "jobid": args.job.jobid,
                    "downloaded": downloaded,
                }));
            }
            println!("Downloaded {} spool file(s):", downloaded.len());
            for path in &downloaded {
                println!("  {}", path.display());
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// cancel / delete / modify / search

#[derive(Debug, Args)]
pub struct JobActionArgs {
    #[command(flatten)]
    pub job: JobIdentifierArgs,
    /// Interface version: 1.0 is asynchronous, 2.0 waits for feedback.
    #[arg(long, value_name = "VERSION", default_value = "1.0")]
    pub modify_version: String,
}

#[derive(Debug, Args)]
pub struct ModifyArgs {
    #[command(flatten)]
    pub job: JobIdentifierArgs,
    /// Hold the job.
    #[arg(long, conflicts_with = "release")]
    pub hold: bool,
    /// Release a held job.
    #[arg(long)]
    pub release: bool,
    /// New single-character job class.
    #[arg(long, value_name = "CLASS")]
    pub job_class: Option<String>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Job name prefix to scan, wildcards allowed.
    #[arg(value_name = "PREFIX")]
    pub prefix: String,
    /// Literal text to look for.
    #[arg(
        long,
        value_name = "STRING",
        required_unless_present = "search_regex",
        conflicts_with = "search_regex"
    )]
    pub search_string: Option<String>,
    /// Regular expression to look for.
    #[arg(long, value_name = "REGEX")]
    pub search_regex: Option<String>,
    /// Restrict to jobs of this owner.
    #[arg(long, value_name = "OWNER")]
    pub owner: Option<String>,
    /// Restrict to this job ID.
    #[arg(long, value_name = "JOBID")]
    pub jobid: Option<String>,
    /// Match case-insensitively.
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub case_insensitive: bool,
    /// Most matches reported per spool file.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub search_limit: usize,
    /// Most spool files scanned per job.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_FILE_LIMIT)]
    pub file_limit: usize,
}

async fn search(
    session: &ZosmfSession,
    format: OutputFormat,
    args: SearchArgs,
) -> miette::Result<()> {
    let options = SearchOptions {
        owner: args.owner.clone(),
        jobid: args.jobid.clone(),
        search_string: args.search_string.clone(),
        search_regex: args.search_regex.clone(),
        case_insensitive: args.case_insensitive,
        search_limit: args.search_limit,
        file_limit: args.file_limit,
    };
    let outcome = search_jobs(session, &args.prefix, &options).await?;
    if format.is_json() {
        return print_json(&outcome);
    }
    if outcome.matched() {
        print!("{}", outcome.render());
    } else {
        println!("No matches found.");
    }
    Ok(())
}
