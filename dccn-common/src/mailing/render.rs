//! `{{ variable }}` template rendering and per-recipient contexts

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{MessageKind, Recipients};
use crate::model::{SubmissionStatus, UserView};
use crate::snapshot::{ConferenceSnapshot, SubmissionView};
use crate::time::{format_date, format_datetime};
use crate::Result;

/// Variables available to a template
pub type Context = BTreeMap<String, String>;

/// `{{ name }}` with optional `|filter` suffix; filters are accepted and ignored
static VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:\|[^}]*)?\}\}").expect("valid variable regex")
});

/// Substitute variables; unknown variables render empty
pub fn render(template: &str, context: &Context) -> String {
    VARIABLE_REGEX
        .replace_all(template, |caps: &Captures| {
            context.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

fn insert(ctx: &mut Context, key: &str, value: impl ToString) {
    ctx.insert(key.to_string(), value.to_string());
}

fn markdown_list<'a>(titles: impl IntoIterator<Item = &'a SubmissionView>) -> String {
    titles
        .into_iter()
        .map(|s| {
            if s.submission.has_title() {
                format!("- {}", s.submission.title)
            } else {
                "- *no title*".to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn conference_context(snapshot: &ConferenceSnapshot) -> Context {
    let conf = &snapshot.conference;
    let mut ctx = Context::new();
    insert(&mut ctx, "conf_short_name", &conf.short_name);
    insert(&mut ctx, "conf_full_name", &conf.full_name);
    insert(&mut ctx, "conf_start_date", format_date(conf.start_date));
    insert(&mut ctx, "conf_end_date", format_date(conf.close_date));
    insert(&mut ctx, "conf_site_url", &conf.site_url);
    insert(&mut ctx, "conf_email", &conf.contact_email);
    insert(&mut ctx, "sub_end_date", format_datetime(conf.submission_end));
    insert(&mut ctx, "rev_end_date", format_datetime(conf.review_end));
    ctx
}

/// Profile, authored papers and assigned reviews of the user
pub fn user_context(snapshot: &ConferenceSnapshot, user: &UserView) -> Context {
    let mut ctx = Context::new();
    insert(&mut ctx, "username", user.full_name());
    insert(&mut ctx, "first_name", &user.profile.first_name);
    insert(&mut ctx, "last_name", &user.profile.last_name);
    insert(&mut ctx, "user_id", user.id());

    let papers = snapshot.submissions_of(user.id());
    let submitted: Vec<&SubmissionView> = papers
        .iter()
        .copied()
        .filter(|s| s.status() == SubmissionStatus::Submitted)
        .collect();
    let under_review: Vec<&SubmissionView> = papers
        .iter()
        .copied()
        .filter(|s| s.status() == SubmissionStatus::UnderReview)
        .collect();
    let complete = submitted.iter().filter(|s| s.is_complete()).count();
    let empty = submitted.iter().filter(|s| s.is_empty()).count();

    insert(&mut ctx, "num_papers", papers.len());
    insert(&mut ctx, "papers_list", markdown_list(papers.iter().copied()));
    insert(&mut ctx, "num_submitted_papers", submitted.len());
    insert(&mut ctx, "submitted_papers_list", markdown_list(submitted.iter().copied()));
    insert(&mut ctx, "num_complete_submitted_papers", complete);
    insert(&mut ctx, "num_incomplete_submitted_papers", submitted.len() - complete);
    insert(&mut ctx, "num_empty_papers", empty);
    insert(&mut ctx, "num_under_review_papers", under_review.len());
    insert(&mut ctx, "under_review_papers_list", markdown_list(under_review.iter().copied()));

    let reviews = snapshot.reviews_of(user.id());
    let num_complete_reviews = reviews
        .iter()
        .filter(|(sub, rv)| rv.review.warnings(sub.min_words_in_review()).is_empty())
        .count();
    insert(&mut ctx, "num_reviews", reviews.len());
    insert(&mut ctx, "num_complete_reviews", num_complete_reviews);
    insert(&mut ctx, "num_incomplete_reviews", reviews.len() - num_complete_reviews);
    ctx
}

pub fn submission_context(sub: &SubmissionView) -> Context {
    let mut ctx = Context::new();
    insert(&mut ctx, "paper_id", sub.id());
    insert(&mut ctx, "paper_title", &sub.submission.title);
    insert(&mut ctx, "paper_abstract", &sub.submission.r#abstract);
    insert(&mut ctx, "paper_authors", sub.authors_display());
    insert(&mut ctx, "paper_status", sub.status().display());
    ctx
}

/// One rendered copy of a group message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedEmail {
    pub user_to: i64,
    pub email: String,
    /// Submission the copy was rendered for (submission messages only)
    pub submission_id: Option<i64>,
    pub subject: String,
    pub text_plain: String,
}

fn render_for(
    subject: &str,
    body: &str,
    base: &Context,
    snapshot: &ConferenceSnapshot,
    user: &UserView,
    sub: Option<&SubmissionView>,
) -> RenderedEmail {
    let mut ctx = base.clone();
    if let Some(sub) = sub {
        ctx.extend(submission_context(sub));
    }
    ctx.extend(user_context(snapshot, user));
    RenderedEmail {
        user_to: user.id(),
        email: user.user.email.clone(),
        submission_id: sub.map(|s| s.id()),
        subject: render(subject, &ctx),
        text_plain: render(body, &ctx),
    }
}

/// Render a group message for every recipient
///
/// User messages produce one copy per user; submission messages one copy per
/// author of each submission.
pub fn compose(
    subject: &str,
    body: &str,
    snapshot: &ConferenceSnapshot,
    recipients: &Recipients<'_>,
) -> Result<Vec<RenderedEmail>> {
    let base = conference_context(snapshot);
    let emails = match recipients {
        Recipients::Users(users) => users
            .iter()
            .map(|u| render_for(subject, body, &base, snapshot, u, None))
            .collect(),
        Recipients::Submissions(subs) => subs
            .iter()
            .flat_map(|s| {
                s.authors
                    .iter()
                    .map(|a| render_for(subject, body, &base, snapshot, &a.user, Some(*s)))
                    .collect::<Vec<_>>()
            })
            .collect(),
    };
    Ok(emails)
}

/// Resolve explicit recipient ids of the given kind against the snapshot
pub fn recipients_by_ids<'a>(
    snapshot: &'a ConferenceSnapshot,
    kind: MessageKind,
    ids: &[i64],
) -> Result<Recipients<'a>> {
    match kind {
        MessageKind::User => {
            let users = ids
                .iter()
                .map(|id| {
                    snapshot
                        .user(*id)
                        .ok_or_else(|| crate::Error::not_found("user", *id))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Recipients::Users(users))
        }
        MessageKind::Submission => {
            let subs = ids
                .iter()
                .map(|id| {
                    snapshot
                        .submission(*id)
                        .ok_or_else(|| crate::Error::not_found("submission", *id))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Recipients::Submissions(subs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fixtures::*;
    use crate::Error;
    use SubmissionStatus::*;

    fn ctx(pairs: &[(&str, &str)]) -> Context {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_render_substitutes_and_blanks_unknown() {
        let c = ctx(&[("username", "Anna Ivanova"), ("paper_id", "7")]);
        assert_eq!(
            render("Dear {{ username }}, paper #{{paper_id}} {{ nope }}!", &c),
            "Dear Anna Ivanova, paper #7 !"
        );
    }

    #[test]
    fn test_render_ignores_filters() {
        let c = ctx(&[("rev_end_date", "01 Jun 2019, 23:59 UTC")]);
        assert_eq!(
            render(r#"at {{ rev_end_date|time:"H:i:s" }}"#, &c),
            "at 01 Jun 2019, 23:59 UTC"
        );
    }

    #[test]
    fn test_user_context_counts() {
        let anna = user(10, "Anna", "Ivanova", "RU", "RUDN");
        let s1 = with_author(submission(1, "First", Submitted), anna.clone());
        let mut s2 = with_author(submission(2, "", Submitted), anna.clone());
        s2.submission.review_manuscript = None;
        let s3 = with_author(submission(3, "Third", UnderReview), anna.clone());
        let s4 = with_review(submission(4, "Other", UnderReview), 10, 0, false);
        let snap = snapshot(vec![s1, s2, s3, s4], vec![anna.clone()]);

        let c = user_context(&snap, &anna);
        assert_eq!(c["username"], "Anna Ivanova");
        assert_eq!(c["num_papers"], "3");
        assert_eq!(c["num_submitted_papers"], "2");
        assert_eq!(c["num_complete_submitted_papers"], "1");
        assert_eq!(c["num_incomplete_submitted_papers"], "1");
        assert_eq!(c["num_empty_papers"], "1");
        assert_eq!(c["num_under_review_papers"], "1");
        assert_eq!(c["num_reviews"], "1");
        assert_eq!(c["num_incomplete_reviews"], "1");
        assert_eq!(c["papers_list"], "- First\n- *no title*\n- Third");
    }

    #[test]
    fn test_compose_submission_message_one_copy_per_author() {
        let anna = user(10, "Anna", "Ivanova", "RU", "RUDN");
        let bob = user(11, "Bob", "Smith", "US", "MIT");
        let s1 = with_author(with_author(submission(1, "Retrials", UnderReview), anna.clone()), bob.clone());
        let snap = snapshot(vec![s1], vec![anna, bob]);

        let recipients = recipients_by_ids(&snap, MessageKind::Submission, &[1]).unwrap();
        let emails = compose(
            "Submission #{{ paper_id }}",
            "Dear {{ username }}, \"{{ paper_title }}\" by {{ paper_authors }} ({{ conf_short_name }})",
            &snap,
            &recipients,
        )
        .unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].subject, "Submission #1");
        assert_eq!(
            emails[1].text_plain,
            "Dear Bob Smith, \"Retrials\" by Anna Ivanova, Bob Smith (DCCN 2019)"
        );
        assert_eq!(emails[1].submission_id, Some(1));
    }

    #[test]
    fn test_unknown_recipient_is_not_found() {
        let snap = snapshot(vec![], vec![]);
        assert!(matches!(
            recipients_by_ids(&snap, MessageKind::User, &[99]),
            Err(Error::NotFound(_))
        ));
    }
}
