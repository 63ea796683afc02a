use super::normalizer::normalize_header;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Applicant attribute a spreadsheet column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicantField {
    SubmittedTimestamp,
    FullName,
    Email,
    Major,
    ClassStanding,
    FridayAvailability,
    ResumeUrl,
    LinkedinUrl,
    /// Zero-based index into the five free-text responses.
    Response(usize),
    AnythingElse,
}

static HEADER_MAP: OnceLock<HashMap<String, ApplicantField>> = OnceLock::new();

/// Resolve a raw header cell; unknown columns resolve to `None` and are ignored.
pub fn field_for_header(header: &str) -> Option<ApplicantField> {
    header_map().get(&normalize_header(header)).copied()
}

fn header_map() -> &'static HashMap<String, ApplicantField> {
    HEADER_MAP.get_or_init(|| {
        use ApplicantField::*;

        const HEADER_TO_FIELD: &[(&str, ApplicantField)] = &[
            ("Timestamp", SubmittedTimestamp),
            ("Submitted Timestamp", SubmittedTimestamp),
            // Identity
            ("Name", FullName),
            ("Full Name", FullName),
            ("Full_Name", FullName),
            ("FullName", FullName),
            ("USC Email", Email),
            ("Email", Email),
            ("Email Address", Email),
            // Academics
            ("Major/Minor", Major),
            ("Major", Major),
            ("Class Standing", ClassStanding),
            (
                "Are you free @ 11am-12pm on Fridays for our cohort curriculum meetings?",
                FridayAvailability,
            ),
            ("Friday Availability", FridayAvailability),
            // Links
            ("Resume", ResumeUrl),
            ("Resume URL", ResumeUrl),
            ("LinkedIn (Optional)", LinkedinUrl),
            ("LinkedIn", LinkedinUrl),
            ("LinkedIn URL", LinkedinUrl),
            // Long-form questions
            (
                "Based on your long-term goals, where does VCA fit in your path, and what are you hoping to get out of joining this organization? (250 words max)",
                Response(0),
            ),
            (
                "Tell us about a company or product you find fascinating. If you had to explain to an investor why it might succeed or fail, what would you focus on? (150 words max)",
                Response(1),
            ),
            (
                "Describe a situation where you had to work with someone who strongly disagreed with you. How did you handle the situation, and what steps did you take to keep the work moving forward? (150 words max)",
                Response(2),
            ),
            (
                "If you could have dinner with one founder, who would you choose? What specifically would you want to learn from them, and how would that insight shape the way you build, lead, or make decisions? (100-150 words)",
                Response(3),
            ),
            (
                "If you could get an honest answer to one question from any founder, what would you ask and why? (50 words max)",
                Response(4),
            ),
            ("Question 1", Response(0)),
            ("Question 2", Response(1)),
            ("Question 3", Response(2)),
            ("Question 4", Response(3)),
            ("Question 5", Response(4)),
            ("Question1 Response", Response(0)),
            ("Question2 Response", Response(1)),
            ("Question3 Response", Response(2)),
            ("Question4 Response", Response(3)),
            ("Question5 Response", Response(4)),
            ("Anything else you want like us to know?", AnythingElse),
            ("Anything Else", AnythingElse),
        ];

        let mut map = HashMap::with_capacity(HEADER_TO_FIELD.len());
        for (header, field) in HEADER_TO_FIELD {
            map.insert(normalize_header(header), *field);
        }
        map
    })
}
