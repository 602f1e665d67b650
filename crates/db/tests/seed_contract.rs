use serde::Deserialize;
use std::collections::HashSet;

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        if $left != $right {
            return Err(format!($($arg)*));
        }
    };
}

const FIXTURE_SQL: &str = include_str!("../../../config/fixtures/mock_dataset.sql");
const CONTRACT_JSON: &str = include_str!("../../../config/fixtures/mock_dataset_contract.json");

const STATUSES: [&str; 5] = ["submitted", "under_review", "approved", "revision_requested", "rejected"];

#[derive(Debug, Deserialize)]
struct UserContract {
    total: usize,
    administrators: Vec<String>,
    approvers: Vec<String>,
    submitters: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct IdeaContract {
    id: String,
    status: String,
    category: String,
    submitter_id: String,
    assigned_approver_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentContract {
    id: String,
    idea_id: String,
    comment_type: String,
}

#[derive(Debug, Deserialize)]
struct SeedContract {
    dataset_version: String,
    seed_dataset: String,
    users: UserContract,
    ideas: Vec<IdeaContract>,
    comments: Vec<CommentContract>,
}

fn load_contract() -> SeedContractTestResult<SeedContract> {
    serde_json::from_str(CONTRACT_JSON).map_err(|error| format!("seed contract must parse: {error}"))
}

/// The VALUES tuple that starts with the given id, up to its closing parenthesis.
fn tuple_for<'a>(sql: &'a str, id: &str) -> SeedContractTestResult<&'a str> {
    let marker = format!("('{id}',");
    let start = sql.find(&marker).ok_or_else(|| format!("fixture row `{id}` is missing"))?;
    let rest = &sql[start..];
    let end = rest
        .find("),\n")
        .into_iter()
        .chain(rest.find(");"))
        .min()
        .ok_or_else(|| format!("fixture row `{id}` is not terminated"))?;
    Ok(&rest[..end])
}

#[test]
fn contract_header_and_user_roles_match_fixture() -> SeedContractTestResult {
    let contract = load_contract()?;

    require_eq!(contract.dataset_version, "ideaflow-mock-1");
    require_eq!(contract.seed_dataset, "deterministic_idea_workflow");

    let users = &contract.users;
    require_eq!(
        users.administrators.len() + users.approvers.len() + users.submitters.len(),
        users.total
    );

    for (role, ids) in [
        ("administrator", &users.administrators),
        ("approver", &users.approvers),
        ("submitter", &users.submitters),
    ] {
        for id in ids {
            let row = tuple_for(FIXTURE_SQL, id)?;
            require!(
                row.contains(&format!("'{role}'")),
                "user `{id}` should be seeded with role `{role}`"
            );
            if role == "approver" {
                require!(!row.contains("'[]'"), "approver `{id}` should review at least one category");
            }
        }
    }

    Ok(())
}

#[test]
fn every_contract_idea_is_seeded_with_its_status_and_owner() -> SeedContractTestResult {
    let contract = load_contract()?;
    let mut statuses_seen = HashSet::new();
    let mut ids_seen = HashSet::new();

    require_eq!(contract.ideas.len(), 12);

    for idea in &contract.ideas {
        require!(ids_seen.insert(idea.id.as_str()), "idea `{}` is listed twice", idea.id);
        require!(
            STATUSES.contains(&idea.status.as_str()),
            "idea `{}` has unknown status `{}`",
            idea.id,
            idea.status
        );
        statuses_seen.insert(idea.status.as_str());

        let row = tuple_for(FIXTURE_SQL, &idea.id)?;
        for expected in [&idea.status, &idea.category, &idea.submitter_id] {
            require!(
                row.contains(&format!("'{expected}'")),
                "idea `{}` row should contain `{expected}`",
                idea.id
            );
        }

        match &idea.assigned_approver_id {
            Some(approver) => {
                require!(
                    contract.users.approvers.contains(approver),
                    "idea `{}` is assigned to non-approver `{approver}`",
                    idea.id
                );
                require!(row.contains(&format!("'{approver}'")));
            }
            None => require_eq!(
                idea.status,
                "submitted",
                "only submitted ideas may be unassigned (idea `{}`)",
                idea.id
            ),
        }

        require!(
            FIXTURE_SQL.contains(&format!("('ae-seed-{}', '{}',", idea.id, idea.id)),
            "idea `{}` should carry a seeded submission audit event",
            idea.id
        );
    }

    require_eq!(statuses_seen.len(), STATUSES.len(), "every status should be represented");
    Ok(())
}

#[test]
fn comment_types_follow_the_status_of_their_idea() -> SeedContractTestResult {
    let contract = load_contract()?;

    require_eq!(contract.comments.len(), 9);

    for comment in &contract.comments {
        let idea = contract
            .ideas
            .iter()
            .find(|idea| idea.id == comment.idea_id)
            .ok_or_else(|| format!("comment `{}` targets unknown idea", comment.id))?;

        let expected_status = match comment.comment_type.as_str() {
            "revision_request" => Some("revision_requested"),
            "rejection_reason" => Some("rejected"),
            "general" => None,
            other => return Err(format!("comment `{}` has unknown type `{other}`", comment.id)),
        };
        if let Some(expected_status) = expected_status {
            require_eq!(
                idea.status,
                expected_status,
                "comment `{}` type does not match idea status",
                comment.id
            );
        }

        let row = tuple_for(FIXTURE_SQL, &comment.id)?;
        require!(row.contains(&format!("'{}'", comment.idea_id)));
        require!(row.contains(&format!("'{}'", comment.comment_type)));
    }

    Ok(())
}

#[test]
fn fixture_reloads_without_overwriting() -> SeedContractTestResult {
    let inserts = FIXTURE_SQL.matches("INSERT INTO").count();
    let ignoring_inserts = FIXTURE_SQL.matches("INSERT OR IGNORE INTO").count();

    require_eq!(inserts, 0, "fixture inserts must ignore existing rows");
    require_eq!(ignoring_inserts, 4);
    require!(!FIXTURE_SQL.contains("DELETE FROM"));
    require!(!FIXTURE_SQL.contains("UPDATE "));
    Ok(())
}
