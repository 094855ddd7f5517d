//! Predefined mailing lists

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::MessageKind;
use crate::model::UserView;
use crate::snapshot::{ConferenceSnapshot, SubmissionView};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MailingList {
    AllUsers,
    AllAuthors,
    UsersWithMissingManuscript,
    UsersWithEmptySubmissions,
    AllReviewers,
    ReviewersWithIncompleteReviews,
    AllSubmissions,
    SubmissionsMissingReviewManuscript,
    EmptySubmissions,
}

impl MailingList {
    pub const ALL: [MailingList; 9] = [
        MailingList::AllUsers,
        MailingList::AllAuthors,
        MailingList::UsersWithMissingManuscript,
        MailingList::UsersWithEmptySubmissions,
        MailingList::AllReviewers,
        MailingList::ReviewersWithIncompleteReviews,
        MailingList::AllSubmissions,
        MailingList::SubmissionsMissingReviewManuscript,
        MailingList::EmptySubmissions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MailingList::AllUsers => "ALL_USERS",
            MailingList::AllAuthors => "ALL_AUTHORS",
            MailingList::UsersWithMissingManuscript => "USERS_WITH_MISSING_MANUSCRIPT",
            MailingList::UsersWithEmptySubmissions => "USERS_WITH_EMPTY_SUBMISSIONS",
            MailingList::AllReviewers => "ALL_REVIEWERS",
            MailingList::ReviewersWithIncompleteReviews => "REVIEWERS_WITH_INCOMPLETE_REVIEWS",
            MailingList::AllSubmissions => "ALL_SUBMISSIONS",
            MailingList::SubmissionsMissingReviewManuscript => "SUBMISSIONS_MISSING_REVIEW_MANUSCRIPT",
            MailingList::EmptySubmissions => "EMPTY_SUBMISSIONS",
        }
    }

    pub fn details(&self) -> &'static str {
        match self {
            MailingList::AllUsers => "All users",
            MailingList::AllAuthors => "All users with at least one submission",
            MailingList::UsersWithMissingManuscript => {
                "Users with at least one submission missing review manuscript"
            }
            MailingList::UsersWithEmptySubmissions => "Users with at least one empty submission",
            MailingList::AllReviewers => "All reviewers",
            MailingList::ReviewersWithIncompleteReviews => {
                "Reviewers with at least one incomplete review"
            }
            MailingList::AllSubmissions => "All submissions",
            MailingList::SubmissionsMissingReviewManuscript => "Submissions missing review manuscript",
            MailingList::EmptySubmissions => "Empty submissions",
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            MailingList::AllSubmissions
            | MailingList::SubmissionsMissingReviewManuscript
            | MailingList::EmptySubmissions => MessageKind::Submission,
            _ => MessageKind::User,
        }
    }

    /// Resolve the list against a conference
    pub fn resolve<'a>(&self, snapshot: &'a ConferenceSnapshot) -> Recipients<'a> {
        match self.kind() {
            MessageKind::User => Recipients::Users(self.user_recipients(snapshot)),
            MessageKind::Submission => {
                let subs = snapshot
                    .submissions
                    .iter()
                    .filter(|s| self.includes_submission(s))
                    .collect();
                Recipients::Submissions(subs)
            }
        }
    }

    fn includes_submission(&self, sub: &SubmissionView) -> bool {
        match self {
            MailingList::AllSubmissions => true,
            MailingList::SubmissionsMissingReviewManuscript => {
                !sub.submission.has_review_manuscript() && sub.submission.has_title()
            }
            MailingList::EmptySubmissions => !sub.submission.has_title(),
            _ => false,
        }
    }

    fn user_recipients<'a>(&self, snapshot: &'a ConferenceSnapshot) -> Vec<&'a UserView> {
        let authors_where = |pred: &dyn Fn(&SubmissionView) -> bool| -> BTreeSet<i64> {
            snapshot
                .submissions
                .iter()
                .filter(|s| pred(*s))
                .flat_map(|s| s.authors.iter().map(|a| a.author.user_id))
                .collect()
        };

        let ids: Option<BTreeSet<i64>> = match self {
            MailingList::AllUsers => None,
            MailingList::AllAuthors => Some(snapshot.author_ids()),
            MailingList::UsersWithMissingManuscript => {
                Some(authors_where(&|s: &SubmissionView| !s.submission.has_review_manuscript()))
            }
            MailingList::UsersWithEmptySubmissions => {
                Some(authors_where(&|s: &SubmissionView| !s.submission.has_title()))
            }
            MailingList::AllReviewers => {
                Some(snapshot.reviewers.iter().map(|r| r.user_id).collect())
            }
            MailingList::ReviewersWithIncompleteReviews => Some(
                snapshot
                    .submissions
                    .iter()
                    .flat_map(|s| s.reviews())
                    .filter(|r| !r.review.submitted)
                    .map(|r| r.reviewer.user_id)
                    .collect(),
            ),
            _ => Some(BTreeSet::new()),
        };

        snapshot
            .users
            .iter()
            .filter(|u| ids.as_ref().map(|ids| ids.contains(&u.id())).unwrap_or(true))
            .collect()
    }
}

impl fmt::Display for MailingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MailingList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MailingList::ALL
            .iter()
            .copied()
            .find(|l| l.name() == s)
            .ok_or_else(|| Error::NotFound(format!("mailing list {}", s)))
    }
}

/// Resolved members of a mailing list
#[derive(Debug, Clone)]
pub enum Recipients<'a> {
    Users(Vec<&'a UserView>),
    Submissions(Vec<&'a SubmissionView>),
}

impl<'a> Recipients<'a> {
    pub fn kind(&self) -> MessageKind {
        match self {
            Recipients::Users(_) => MessageKind::User,
            Recipients::Submissions(_) => MessageKind::Submission,
        }
    }

    /// Ids of the listed objects (users or submissions)
    pub fn object_ids(&self) -> Vec<i64> {
        match self {
            Recipients::Users(users) => users.iter().map(|u| u.id()).collect(),
            Recipients::Submissions(subs) => subs.iter().map(|s| s.id()).collect(),
        }
    }

    /// Distinct users receiving mail, ordered by id
    pub fn users(&self) -> Vec<&'a UserView> {
        match self {
            Recipients::Users(users) => users.clone(),
            Recipients::Submissions(subs) => {
                let mut seen = BTreeSet::new();
                let mut users: Vec<&'a UserView> = subs
                    .iter()
                    .copied()
                    .flat_map(|s| s.authors.iter().map(|a| &a.user))
                    .filter(|u| seen.insert(u.id()))
                    .collect();
                users.sort_by_key(|u| u.id());
                users
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Reviewer, SubmissionStatus::*};
    use crate::snapshot::fixtures::*;

    fn sample() -> ConferenceSnapshot {
        let anna = user(10, "Anna", "Ivanova", "RU", "RUDN");
        let bob = user(11, "Bob", "Smith", "US", "MIT");
        let carl = user(12, "Carl", "Berg", "DE", "TUM");
        let dana = user(13, "Dana", "Lee", "RU", "MSU");

        let s1 = with_review(with_author(submission(1, "Complete", UnderReview), anna.clone()), 13, 0, false);
        let mut s2 = with_author(with_author(submission(2, "No manuscript", Submitted), bob.clone()), anna.clone());
        s2.submission.review_manuscript = None;
        let mut s3 = with_author(submission(3, "", Submitted), carl.clone());
        s3.submission.review_manuscript = None;

        let mut snap = snapshot(vec![s1, s2, s3], vec![anna, bob, carl, dana]);
        snap.reviewers = vec![
            Reviewer { id: 1, user_id: 13, conference_id: 1 },
            Reviewer { id: 2, user_id: 11, conference_id: 1 },
        ];
        snap
    }

    fn user_ids(list: MailingList, snap: &ConferenceSnapshot) -> Vec<i64> {
        list.resolve(snap).users().iter().map(|u| u.id()).collect()
    }

    #[test]
    fn test_parse_list_names() {
        for list in MailingList::ALL {
            assert_eq!(list.name().parse::<MailingList>().unwrap(), list);
        }
        assert!(matches!("NOBODY".parse::<MailingList>(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_user_lists() {
        let snap = sample();
        assert_eq!(user_ids(MailingList::AllUsers, &snap), vec![10, 11, 12, 13]);
        assert_eq!(user_ids(MailingList::AllAuthors, &snap), vec![10, 11, 12]);
        assert_eq!(user_ids(MailingList::UsersWithMissingManuscript, &snap), vec![10, 11, 12]);
        assert_eq!(user_ids(MailingList::UsersWithEmptySubmissions, &snap), vec![12]);
        assert_eq!(user_ids(MailingList::AllReviewers, &snap), vec![11, 13]);
        assert_eq!(user_ids(MailingList::ReviewersWithIncompleteReviews, &snap), vec![13]);
    }

    #[test]
    fn test_submission_lists() {
        let snap = sample();
        let missing = MailingList::SubmissionsMissingReviewManuscript.resolve(&snap);
        assert_eq!(missing.kind(), MessageKind::Submission);
        assert_eq!(missing.object_ids(), vec![2]);
        assert_eq!(missing.users().iter().map(|u| u.id()).collect::<Vec<_>>(), vec![10, 11]);

        assert_eq!(MailingList::EmptySubmissions.resolve(&snap).object_ids(), vec![3]);
        assert_eq!(MailingList::AllSubmissions.resolve(&snap).object_ids(), vec![1, 2, 3]);
    }
}
