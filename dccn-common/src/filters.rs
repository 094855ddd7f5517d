//! Submission and user filters
//!
//! A filter is a conjunction of independent predicates. Each predicate only
//! looks at the item itself, so predicates can be applied in any order and
//! the surviving items keep their relative order.
//!
//! Multi-valued parameters arrive as repeated query keys
//! (`status=REVIEW&status=ACCEPT`). Code lists also accept comma-separated
//! values (`status=REVIEW,ACCEPT`); affiliations are free text and are never
//! split. Empty values impose no constraint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::countries;
use crate::model::{SubmissionStatus, UserView};
use crate::snapshot::{ConferenceSnapshot, SubmissionView};
use crate::{Error, Result};

/// A single condition over items of type `T`
pub trait Predicate<T: ?Sized> {
    fn matches(&self, item: &T) -> bool;
}

/// Keep the items matching every predicate
pub fn apply_all<'a, T, P>(items: impl IntoIterator<Item = &'a T>, predicates: &[P]) -> Vec<&'a T>
where
    T: 'a + ?Sized,
    P: Predicate<T>,
{
    items
        .into_iter()
        .filter(|item| predicates.iter().all(|p| p.matches(item)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Completion {
    Empty,
    Incomplete,
    Complete,
}

impl FromStr for Completion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "EMPTY" => Ok(Completion::Empty),
            "INCOMPLETE" => Ok(Completion::Incomplete),
            "COMPLETE" => Ok(Completion::Complete),
            other => Err(Error::InvalidInput(format!("unknown completion: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Attending {
    Yes,
    No,
}

impl FromStr for Attending {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "YES" => Ok(Attending::Yes),
            "NO" => Ok(Attending::No),
            other => Err(Error::InvalidInput(format!("unknown attending value: {}", other))),
        }
    }
}

fn split_terms(term: &str) -> Vec<String> {
    term.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionPredicate {
    /// Every word occurs in the title or in an author's name
    Term(Vec<String>),
    Completion(BTreeSet<Completion>),
    Types(BTreeSet<i64>),
    Topics(BTreeSet<i64>),
    Status(BTreeSet<SubmissionStatus>),
    Countries(BTreeSet<String>),
    Affiliations(BTreeSet<String>),
}

impl Predicate<SubmissionView> for SubmissionPredicate {
    fn matches(&self, sub: &SubmissionView) -> bool {
        match self {
            SubmissionPredicate::Term(words) => {
                let title = sub.submission.title.to_lowercase();
                let names: Vec<(String, String)> = sub
                    .authors
                    .iter()
                    .map(|a| {
                        (
                            a.user.profile.full_name().to_lowercase(),
                            a.user.profile.full_name_rus().to_lowercase(),
                        )
                    })
                    .collect();
                words.iter().all(|w| {
                    title.contains(w.as_str())
                        || names.iter().any(|(en, ru)| en.contains(w.as_str()) || ru.contains(w.as_str()))
                })
            }
            SubmissionPredicate::Completion(kinds) => {
                let has_warnings = !sub.warnings().is_empty();
                (has_warnings && kinds.contains(&Completion::Incomplete))
                    || (!has_warnings && kinds.contains(&Completion::Complete))
                    || (sub.is_empty() && kinds.contains(&Completion::Empty))
            }
            SubmissionPredicate::Types(ids) => sub
                .submission
                .stype_id
                .map(|id| ids.contains(&id))
                .unwrap_or(false),
            SubmissionPredicate::Topics(ids) => sub.topic_ids.iter().any(|t| ids.contains(t)),
            SubmissionPredicate::Status(statuses) => statuses.contains(&sub.status()),
            SubmissionPredicate::Countries(codes) => sub
                .authors
                .iter()
                .any(|a| codes.contains(&a.user.profile.country)),
            SubmissionPredicate::Affiliations(affs) => sub
                .authors
                .iter()
                .any(|a| affs.contains(&a.user.profile.affiliation)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionFilter {
    pub term: String,
    pub completion: BTreeSet<Completion>,
    pub types: BTreeSet<i64>,
    pub topics: BTreeSet<i64>,
    pub status: BTreeSet<SubmissionStatus>,
    pub countries: BTreeSet<String>,
    pub affiliations: BTreeSet<String>,
}

impl SubmissionFilter {
    pub fn predicates(&self) -> Vec<SubmissionPredicate> {
        let mut predicates = Vec::new();
        let words = split_terms(&self.term);
        if !words.is_empty() {
            predicates.push(SubmissionPredicate::Term(words));
        }
        if !self.completion.is_empty() {
            predicates.push(SubmissionPredicate::Completion(self.completion.clone()));
        }
        if !self.types.is_empty() {
            predicates.push(SubmissionPredicate::Types(self.types.clone()));
        }
        if !self.topics.is_empty() {
            predicates.push(SubmissionPredicate::Topics(self.topics.clone()));
        }
        if !self.status.is_empty() {
            predicates.push(SubmissionPredicate::Status(self.status.clone()));
        }
        if !self.countries.is_empty() {
            predicates.push(SubmissionPredicate::Countries(self.countries.clone()));
        }
        if !self.affiliations.is_empty() {
            predicates.push(SubmissionPredicate::Affiliations(self.affiliations.clone()));
        }
        predicates
    }

    pub fn apply<'a>(&self, submissions: impl IntoIterator<Item = &'a SubmissionView>) -> Vec<&'a SubmissionView> {
        apply_all(submissions, &self.predicates())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserPredicate {
    /// Every word occurs in a name, the affiliation or the country name
    Term(Vec<String>),
    /// Attendance of the listed kinds, given the ids of conference authors
    Attending {
        kinds: BTreeSet<Attending>,
        author_ids: BTreeSet<i64>,
    },
    Countries(BTreeSet<String>),
    Affiliations(BTreeSet<String>),
}

impl Predicate<UserView> for UserPredicate {
    fn matches(&self, user: &UserView) -> bool {
        match self {
            UserPredicate::Term(words) => {
                let p = &user.profile;
                let fields = [
                    p.full_name().to_lowercase(),
                    p.full_name_rus().to_lowercase(),
                    p.affiliation.to_lowercase(),
                    p.country_name().to_lowercase(),
                ];
                words
                    .iter()
                    .all(|w| fields.iter().any(|f| f.contains(w.as_str())))
            }
            UserPredicate::Attending { kinds, author_ids } => {
                let attending = author_ids.contains(&user.id());
                (attending && kinds.contains(&Attending::Yes))
                    || (!attending && kinds.contains(&Attending::No))
            }
            UserPredicate::Countries(codes) => codes.contains(&user.profile.country),
            UserPredicate::Affiliations(affs) => affs.contains(&user.profile.affiliation),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub term: String,
    pub attending: BTreeSet<Attending>,
    pub countries: BTreeSet<String>,
    pub affiliations: BTreeSet<String>,
}

impl UserFilter {
    pub fn predicates(&self, author_ids: &BTreeSet<i64>) -> Vec<UserPredicate> {
        let mut predicates = Vec::new();
        let words = split_terms(&self.term);
        if !words.is_empty() {
            predicates.push(UserPredicate::Term(words));
        }
        if !self.attending.is_empty() {
            predicates.push(UserPredicate::Attending {
                kinds: self.attending.clone(),
                author_ids: author_ids.clone(),
            });
        }
        if !self.countries.is_empty() {
            predicates.push(UserPredicate::Countries(self.countries.clone()));
        }
        if !self.affiliations.is_empty() {
            predicates.push(UserPredicate::Affiliations(self.affiliations.clone()));
        }
        predicates
    }

    pub fn apply<'a>(&self, snapshot: &'a ConferenceSnapshot) -> Vec<&'a UserView> {
        apply_all(&snapshot.users, &self.predicates(&snapshot.author_ids()))
    }
}

/// Raw filter parameters as received in a query string
///
/// Deserialized from the `(key, value)` pairs of the query so that keys may
/// repeat; unknown keys such as `page` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct FilterParams {
    pub term: Option<String>,
    pub completion: Vec<String>,
    pub types: Vec<String>,
    pub topics: Vec<String>,
    pub status: Vec<String>,
    pub countries: Vec<String>,
    pub affiliations: Vec<String>,
    pub attending: Vec<String>,
}

impl From<Vec<(String, String)>> for FilterParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut params = FilterParams::default();
        for (key, value) in pairs {
            let values = match key.as_str() {
                "term" => {
                    params.term = Some(value);
                    continue;
                }
                "completion" => &mut params.completion,
                "types" => &mut params.types,
                "topics" => &mut params.topics,
                "status" => &mut params.status,
                "countries" => &mut params.countries,
                "affiliations" => &mut params.affiliations,
                "attending" => &mut params.attending,
                _ => continue,
            };
            values.push(value);
        }
        params
    }
}

/// Parse code lists; every value may hold several comma-separated codes
pub fn parse_list<T>(values: &[String]) -> Result<BTreeSet<T>>
where
    T: FromStr + Ord,
    T::Err: std::fmt::Display,
{
    let mut out = BTreeSet::new();
    for part in values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let value = part
            .parse::<T>()
            .map_err(|e| Error::InvalidInput(format!("{}: {}", part, e)))?;
        out.insert(value);
    }
    Ok(out)
}

/// Whole free-text values, blank ones skipped
fn parse_text(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

impl FilterParams {
    pub fn submission_filter(&self) -> Result<SubmissionFilter> {
        Ok(SubmissionFilter {
            term: self.term.clone().unwrap_or_default(),
            completion: parse_list(&self.completion)?,
            types: parse_list(&self.types)?,
            topics: parse_list(&self.topics)?,
            status: parse_list(&self.status)?,
            countries: parse_list(&self.countries)?,
            affiliations: parse_text(&self.affiliations),
        })
    }

    pub fn user_filter(&self) -> Result<UserFilter> {
        Ok(UserFilter {
            term: self.term.clone().unwrap_or_default(),
            attending: parse_list(&self.attending)?,
            countries: parse_list(&self.countries)?,
            affiliations: parse_text(&self.affiliations),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice<K> {
    pub value: K,
    pub label: String,
}

/// Choices offered by the submission and user filters of a conference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub types: Vec<Choice<i64>>,
    pub topics: Vec<Choice<i64>>,
    pub status: Vec<Choice<SubmissionStatus>>,
    /// Author countries, sorted by display name
    pub countries: Vec<Choice<String>>,
    /// Author affiliations, sorted
    pub affiliations: Vec<Choice<String>>,
}

pub fn filter_options(snapshot: &ConferenceSnapshot) -> FilterOptions {
    let profiles = || {
        snapshot
            .submissions
            .iter()
            .flat_map(|s| s.authors.iter().map(|a| &a.user.profile))
    };

    let codes: BTreeSet<&str> = profiles()
        .map(|p| p.country.as_str())
        .filter(|c| !c.is_empty())
        .collect();
    let mut countries: Vec<Choice<String>> = codes
        .into_iter()
        .map(|code| Choice {
            value: code.to_string(),
            label: countries::name_of(code).to_string(),
        })
        .collect();
    countries.sort_by(|a, b| a.label.cmp(&b.label));

    let affiliations: BTreeSet<&str> = profiles()
        .map(|p| p.affiliation.as_str())
        .filter(|a| !a.is_empty())
        .collect();

    let mut topics: Vec<_> = snapshot.topics.iter().collect();
    topics.sort_by_key(|t| (t.order, t.id));

    FilterOptions {
        types: snapshot
            .stypes
            .iter()
            .map(|st| Choice { value: st.id, label: st.name.clone() })
            .collect(),
        topics: topics
            .into_iter()
            .map(|t| Choice { value: t.id, label: t.name.clone() })
            .collect(),
        status: SubmissionStatus::ALL
            .iter()
            .map(|s| Choice { value: *s, label: s.display().to_string() })
            .collect(),
        countries,
        affiliations: affiliations
            .into_iter()
            .map(|a| Choice { value: a.to_string(), label: a.to_string() })
            .collect(),
    }
}
