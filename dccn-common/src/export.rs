//! CSV exports of submissions and users

use std::collections::BTreeSet;

use crate::snapshot::ConferenceSnapshot;
use crate::{Error, Result};

pub const SUBMISSION_COLUMNS: [&str; 10] = [
    "#", "ID", "TITLE", "AUTHORS", "COUNTRY", "CORR_AUTHOR", "CORR_EMAIL", "LANGUAGE", "STATUS",
    "SCORE",
];

pub const USER_COLUMNS: [&str; 8] = [
    "ID", "FULL_NAME", "FULL_NAME_RUS", "EMAIL", "COUNTRY", "AFFILIATION", "DEGREE",
    "NUM_SUBMISSIONS",
];

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("CSV is not UTF-8: {}", e)))
}

/// One row per submission, ordered by id
///
/// The corresponding author is the user who created the submission; the
/// country column lists distinct author countries.
pub fn submissions_csv(snapshot: &ConferenceSnapshot) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SUBMISSION_COLUMNS)?;

    let mut subs: Vec<_> = snapshot.submissions.iter().collect();
    subs.sort_by_key(|s| s.id());

    for (number, sub) in subs.into_iter().enumerate() {
        let countries: BTreeSet<&str> = sub
            .authors
            .iter()
            .map(|a| a.user.profile.country_name())
            .filter(|c| !c.is_empty())
            .collect();
        let owner = sub.submission.created_by.and_then(|id| snapshot.user(id));
        let language = sub
            .stype
            .as_ref()
            .map(|st| st.language.display())
            .unwrap_or("");
        let score = sub.score();

        writer.write_record([
            (number + 1).to_string(),
            sub.id().to_string(),
            sub.submission.title.clone(),
            sub.authors_display(),
            countries.into_iter().collect::<Vec<_>>().join(", "),
            owner.map(|u| u.full_name()).unwrap_or_default(),
            owner.map(|u| u.user.email.clone()).unwrap_or_default(),
            language.to_string(),
            sub.status().code().to_string(),
            if score > 0.0 { format!("{:.2}", score) } else { String::new() },
        ])?;
    }
    finish(writer)
}

/// One row per user, ordered by id, with the number of papers they author
/// in this conference
pub fn users_csv(snapshot: &ConferenceSnapshot) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(USER_COLUMNS)?;

    let mut users: Vec<_> = snapshot.users.iter().collect();
    users.sort_by_key(|u| u.id());

    for user in users {
        let profile = &user.profile;
        writer.write_record([
            user.id().to_string(),
            profile.full_name(),
            profile.full_name_rus(),
            user.user.email.clone(),
            profile.country_name().to_string(),
            profile.affiliation.clone(),
            profile.degree.clone(),
            snapshot.submissions_of(user.id()).len().to_string(),
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SubmissionStatus::*;
    use crate::snapshot::fixtures::*;

    #[test]
    fn test_submissions_csv() {
        let anna = user(10, "Anna", "Ivanova", "RU", "RUDN");
        let bob = user(11, "Bob", "Smith", "US", "MIT");
        let mut s2 = with_author(
            with_author(submission(2, "Queues, retrials", UnderReview), anna.clone()),
            bob.clone(),
        );
        s2.submission.created_by = Some(11);
        let s2 = with_review(with_review(s2, 20, 4, true), 21, 3, true);
        let s1 = with_author(submission(1, "Draft", Submitted), anna.clone());
        let snap = snapshot(vec![s2, s1], vec![anna, bob]);

        let csv = submissions_csv(&snap).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "#,ID,TITLE,AUTHORS,COUNTRY,CORR_AUTHOR,CORR_EMAIL,LANGUAGE,STATUS,SCORE"
        );
        assert_eq!(lines[1], "1,1,Draft,Anna Ivanova,Russia,,,English,SUBMIT,");
        assert_eq!(
            lines[2],
            "2,2,\"Queues, retrials\",\"Anna Ivanova, Bob Smith\",\"Russia, United States of America\",Bob Smith,user11@example.org,English,REVIEW,3.50"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_users_csv_counts_authorship() {
        let anna = user(10, "Anna", "Ivanova", "RU", "RUDN");
        let bob = user(11, "Bob", "Smith", "US", "MIT");
        let s1 = with_author(submission(1, "One", Submitted), anna.clone());
        let s2 = with_author(submission(2, "Two", Submitted), anna.clone());
        let snap = snapshot(vec![s1, s2], vec![bob, anna]);

        let csv = users_csv(&snap).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], USER_COLUMNS.join(","));
        assert_eq!(lines[1], "10,Anna Ivanova,,user10@example.org,Russia,RUDN,,2");
        assert_eq!(lines[2], "11,Bob Smith,,user11@example.org,United States of America,MIT,,0");
    }
}
