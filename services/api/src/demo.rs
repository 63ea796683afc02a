use crate::infra::{in_memory_services, StoreServices};
use applicant_review::domain::{ApplicantDetails, Role, RubricScores, User};
use applicant_review::error::AppError;
use applicant_review::workflows::intake::{ApplicationImporter, ApplicationRow};
use applicant_review::workflows::reviews::ReviewSubmission;
use applicant_review::workflows::users::NewUserInput;
use chrono::{Duration, Utc};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

const DEMO_MAJORS: [&str; 4] = ["Computer Science", "Economics", "Biology", "Design"];
const DEMO_STANDINGS: [&str; 4] = ["Freshman", "Sophomore", "Junior", "Senior"];

#[derive(Args, Debug)]
pub(crate) struct AllocationPreviewArgs {
    /// Application spreadsheet export (CSV)
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Comma-separated reviewer usernames taking part in the round
    #[arg(long, value_delimiter = ',', required = true)]
    pub(crate) reviewers: Vec<String>,
    /// Print every application with its assigned reviewers
    #[arg(long)]
    pub(crate) show_assignments: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of synthetic reviewers
    #[arg(long, default_value_t = 3)]
    pub(crate) reviewers: usize,
    /// Number of synthetic applications
    #[arg(long, default_value_t = 5)]
    pub(crate) applications: usize,
    /// Stop after the allocation step
    #[arg(long)]
    pub(crate) skip_reviews: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            reviewers: 3,
            applications: 5,
            skip_reviews: false,
        }
    }
}

pub(crate) fn run_allocation_preview(args: AllocationPreviewArgs) -> Result<(), AppError> {
    let AllocationPreviewArgs {
        csv,
        reviewers,
        show_assignments,
    } = args;

    let services = in_memory_services();
    for username in &reviewers {
        register_reviewer(&services, username)?;
    }

    let rows = ApplicationImporter::from_path(&csv)?;
    let report = services.intake.upload(None, rows)?;
    println!("Allocation preview for {}", csv.display());
    println!(
        "- {} applications accepted | {} duplicates | {} rejected",
        report.success,
        report.duplicates,
        report.errors.len()
    );
    for error in &report.errors {
        println!("  - {error}");
    }

    let summary = services.allocation.allocate(None)?;
    println!(
        "- {} assignments across {} reviewers",
        summary.assignment_count, summary.reviewer_count
    );

    let overview = services.allocation.allocations()?;
    let mut load: BTreeMap<&str, usize> = overview
        .reviewers
        .iter()
        .map(|reviewer| (reviewer.username.as_str(), 0))
        .collect();
    for allocation in &overview.allocations {
        for reviewer in &allocation.reviewers {
            *load.entry(reviewer.username.as_str()).or_default() += 1;
        }
    }
    println!("Reviewer load:");
    for (username, count) in &load {
        println!("  - {username}: {count}");
    }

    if show_assignments {
        println!("Assignments:");
        for allocation in &overview.allocations {
            let names: Vec<&str> = allocation
                .reviewers
                .iter()
                .map(|reviewer| reviewer.username.as_str())
                .collect();
            println!("  - {} -> {}", allocation.full_name, names.join(", "));
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        reviewers,
        applications,
        skip_reviews,
    } = args;

    println!("Applicant review demo");
    let services = in_memory_services();

    let roster = (1..=reviewers)
        .map(|index| register_reviewer(&services, &format!("reviewer-{index}")))
        .collect::<Result<Vec<_>, _>>()?;

    let report = services
        .intake
        .upload(None, demo_applications(applications))?;
    println!(
        "- Uploaded {} applications in {}",
        report.success, report.batch_id
    );

    let summary = match services.allocation.allocate(None) {
        Ok(summary) => summary,
        Err(err) => {
            println!("  Allocation skipped: {err}");
            return Ok(());
        }
    };
    println!(
        "- Allocated {} assignments across {} reviewers",
        summary.assignment_count, summary.reviewer_count
    );

    if skip_reviews {
        return Ok(());
    }

    for (position, reviewer) in roster.iter().enumerate() {
        let mut submitted = 0usize;
        while let Some(next) = services.reviews.next_for_reviewer(reviewer.id)? {
            let submission = ReviewSubmission {
                application_id: next.application.id,
                scores: demo_scores(position, next.application.id.0),
                comments: None,
                started_at: Some(Utc::now() - Duration::minutes(5 + position as i64 * 3)),
            };
            services.reviews.submit(reviewer.id, submission)?;
            submitted += 1;
        }
        println!("  {} submitted {} reviews", reviewer.username, submitted);
    }

    print_analytics(&services)?;
    print_results(&services)
}

fn register_reviewer(services: &StoreServices, username: &str) -> Result<User, AppError> {
    let created = services.users.create(
        None,
        NewUserInput {
            username: username.to_string(),
            email: None,
            password: None,
            role: Role::Reviewer,
        },
    )?;
    Ok(created.user)
}

fn demo_applications(count: usize) -> Vec<ApplicationRow> {
    (0..count)
        .map(|index| ApplicationRow {
            line: index as u64 + 2,
            details: ApplicantDetails {
                full_name: format!("Applicant {}", index + 1),
                email: format!("applicant{}@example.edu", index + 1),
                major: Some(DEMO_MAJORS[index % DEMO_MAJORS.len()].to_string()),
                class_standing: Some(DEMO_STANDINGS[index % DEMO_STANDINGS.len()].to_string()),
                ..ApplicantDetails::default()
            },
        })
        .collect()
}

/// The first reviewer scores harshly so reviewer averages spread apart.
/// Two reviews per application never clear the outlier gate, so that report stays empty.
fn demo_scores(reviewer_position: usize, application: u64) -> RubricScores {
    if reviewer_position == 0 {
        return RubricScores {
            initiative: 1,
            collaboration: 1,
            curiosity: 1,
            commitment: 2,
        };
    }
    let lift = (application % 3) as u8;
    RubricScores {
        initiative: 2 + lift.min(2),
        collaboration: 3,
        curiosity: 2 + (lift % 2) * 2,
        commitment: 4,
    }
}

fn print_analytics(services: &StoreServices) -> Result<(), AppError> {
    let overall = services.analytics.overall_stats()?;
    println!(
        "\nRound overview: {} applications | {} reviews | {} fully reviewed | {} active reviewers",
        overall.total_applications,
        overall.total_reviews,
        overall.fully_reviewed,
        overall.active_reviewers
    );

    println!("Reviewer analytics:");
    for reviewer in services.analytics.reviewer_analytics()? {
        println!(
            "  - {}: {} reviews | avg {:.2} | {:.1} min | consistency {}",
            reviewer.username,
            reviewer.total_reviews,
            reviewer.average_score,
            reviewer.average_time_minutes,
            reviewer.consistency
        );
    }

    println!("Score distribution:");
    for bucket in services.analytics.score_distribution()? {
        println!("  - {:>2}: {}", bucket.total_score, bucket.count);
    }

    let outliers = services.analytics.outlier_reviews()?;
    if outliers.is_empty() {
        println!("No outlier reviews");
    } else {
        println!("Outlier reviews:");
        for outlier in outliers {
            println!(
                "  - {} scored {} as {} (others {:?}, deviation {:.1})",
                outlier.reviewer_name,
                outlier.applicant_name,
                outlier.score,
                outlier.other_scores,
                outlier.deviation
            );
        }
    }
    Ok(())
}

fn print_results(services: &StoreServices) -> Result<(), AppError> {
    println!("\nRanked results:");
    for result in services.results.ranked(Role::Admin)? {
        println!(
            "  {:>2}. {} | {} reviews | avg {:.2} | p{}",
            result.rank, result.full_name, result.review_count, result.avg_total, result.percentile
        );
    }
    Ok(())
}
