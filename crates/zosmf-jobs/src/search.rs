//! Scan spool output across jobs for a string or regular expression.
//!
//! Lists jobs by prefix, walks each job's spool files, and scans the
//! content line by line. A spool file that cannot be fetched is
//! recorded against the job and the scan moves on.

use crate::get::{self, GetJobsOptions};
use crate::types::Job;
use regex::RegexBuilder;
use serde::Serialize;
use zosmf_sdk::{Result, ZosmfError, ZosmfSession};

/// Most matches reported per spool file when no limit is configured.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;
/// Most spool files scanned per job when no limit is configured.
pub const DEFAULT_FILE_LIMIT: usize = 100;

/// Controls for a spool search. Exactly one of `search_string` and
/// `search_regex` must be set.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Restrict the job list to an owner or owner pattern.
    pub owner: Option<String>,
    /// Restrict the job list to one job ID.
    pub jobid: Option<String>,
    /// Literal text to look for.
    pub search_string: Option<String>,
    /// Regular expression to look for.
    pub search_regex: Option<String>,
    pub case_insensitive: bool,
    /// Most matches reported per spool file.
    pub search_limit: usize,
    /// Most spool files scanned per job.
    pub file_limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            owner: None,
            jobid: None,
            search_string: None,
            search_regex: None,
            case_insensitive: true,
            search_limit: DEFAULT_SEARCH_LIMIT,
            file_limit: DEFAULT_FILE_LIMIT,
        }
    }
}

/// One matching line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpoolMatch {
    /// 1-based line number within the spool file.
    pub line_number: usize,
    /// 1-based column of the first hit, string searches only.
    pub column: Option<usize>,
    pub line: String,
}

/// Matches found in one spool file, or the reason it could not be
/// scanned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpoolFileMatches {
    pub ddname: String,
    pub id: i64,
    pub matches: Vec<SpoolMatch>,
    pub error: Option<String>,
}

/// Search results for one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSearchResult {
    pub jobname: String,
    pub jobid: String,
    pub files: Vec<SpoolFileMatches>,
    /// Set when the job's spool file list could not be fetched.
    pub error: Option<String>,
}

/// All jobs that produced matches or scan failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub jobs: Vec<JobSearchResult>,
}

impl SearchOutcome {
    /// True when at least one line matched somewhere.
    pub fn matched(&self) -> bool {
        self.jobs
            .iter()
            .any(|job| job.files.iter().any(|file| !file.matches.is_empty()))
    }

    /// Render the results as a report, one job per block.
    pub fn render(&self) -> String {
        let mut report = String::new();
        for job in &self.jobs {
            report.push_str(&format!("Job Name: {} Job Id: {}\n", job.jobname, job.jobid));
            if let Some(error) = &job.error {
                report.push_str(&format!("    Could not list spool files: {error}\n"));
            }
            for file in &job.files {
                if let Some(error) = &file.error {
                    report.push_str(&format!(
                        "    Spool file: {} (ID #{}) could not be searched: {error}\n",
                        file.ddname, file.id
                    ));
                    continue;
                }
                report.push_str(&format!(
                    "    Spool file: {} (ID #{})\n",
                    file.ddname, file.id
                ));
                for hit in &file.matches {
                    report.push_str(&format!("        Line {} : {}\n", hit.line_number, hit.line));
                }
            }
        }
        report
    }
}

enum Matcher {
    Text { needle: String, fold: bool },
    Pattern(regex::Regex),
}

impl Matcher {
    fn from_options(options: &SearchOptions) -> Result<Self> {
        match (&options.search_string, &options.search_regex) {
            (Some(_), Some(_)) => Err(ZosmfError::validation(
                "the search string and search regex parameters are mutually exclusive",
            )),
            (None, None) => Err(ZosmfError::validation(
                "either the search string or the search regex parameter is required",
            )),
            (Some(needle), None) => Ok(Self::Text {
                needle: if options.case_insensitive {
                    needle.to_lowercase()
                } else {
                    needle.clone()
                },
                fold: options.case_insensitive,
            }),
            (None, Some(pattern)) => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(options.case_insensitive)
                    .build()
                    .map_err(|err| {
                        ZosmfError::validation(format!("invalid search regex: {err}"))
                    })?;
                Ok(Self::Pattern(regex))
            }
        }
    }

    /// 1-based column of the first hit on the line, if any. Regex
    /// matches report no column.
    fn hit(&self, line: &str) -> Option<Option<usize>> {
        match self {
            Self::Text { needle, fold } => {
                let haystack = if *fold { line.to_lowercase() } else { line.to_string() };
                haystack.find(needle.as_str()).map(|at| Some(at + 1))
            }
            Self::Pattern(regex) => regex.is_match(line).then_some(None),
        }
    }
}

/// Search the spool output of every job matching a name prefix.
pub async fn search_jobs(
    session: &ZosmfSession,
    prefix: &str,
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    if prefix.trim().is_empty() {
        return Err(ZosmfError::validation("job name prefix is required"));
    }
    let matcher = Matcher::from_options(options)?;

    let jobs = get::get_jobs_common(
        session,
        &GetJobsOptions {
            prefix: Some(prefix.to_string()),
            owner: options.owner.clone(),
            jobid: options.jobid.clone(),
            ..Default::default()
        },
    )
    .await?;
    tracing::debug!(%prefix, jobs = jobs.len(), "searching spool content");

    let mut outcome = SearchOutcome::default();
    for job in jobs {
        let result = search_one_job(session, &job, &matcher, options).await;
        if !result.files.is_empty() || result.error.is_some() {
            outcome.jobs.push(result);
        }
    }
    Ok(outcome)
}

async fn search_one_job(
    session: &ZosmfSession,
    job: &Job,
    matcher: &Matcher,
    options: &SearchOptions,
) -> JobSearchResult {
    let mut result = JobSearchResult {
        jobname: job.jobname.clone(),
        jobid: job.jobid.clone(),
        files: Vec::new(),
        error: None,
    };
    let files = match get::get_spool_files_for_job(session, job).await {
        Ok(files) => files,
        Err(err) => {
            tracing::warn!(jobname = %job.jobname, jobid = %job.jobid, error = %err, "spool list failed");
            result.error = Some(err.to_string());
            return result;
        }
    };
    for file in files.into_iter().take(options.file_limit) {
        match get::get_spool_content(session, &file).await {
            Ok(content) => {
                let mut matches = Vec::new();
                for (index, line) in content.lines().enumerate() {
                    if matches.len() >= options.search_limit {
                        break;
                    }
                    if let Some(column) = matcher.hit(line) {
                        matches.push(SpoolMatch {
                            line_number: index + 1,
                            column,
                            line: line.to_string(),
                        });
                    }
                }
                if !matches.is_empty() {
                    result.files.push(SpoolFileMatches {
                        ddname: file.ddname,
                        id: file.id,
                        matches,
                        error: None,
                    });
                }
            }
            Err(err) => {
                tracing::warn!(ddname = %file.ddname, id = file.id, error = %err, "spool fetch failed");
                result.files.push(SpoolFileMatches {
                    ddname: file.ddname,
                    id: file.id,
                    matches: Vec::new(),
                    error: Some(err.to_string()),
                });
            }
        }
    }
    result
}
