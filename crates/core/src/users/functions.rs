use chrono::{DateTime, Utc};

use crate::storage::RepositoryError;

use super::{Role, UpsertPlan, UpsertUser, User};

/// Resolves an upsert request into the concrete write.
///
/// - `open_id` must be non-empty.
/// - On insert, an explicit role wins; otherwise the owner identity gets
///   `Admin` and everyone else `User`.
/// - On update, the role only changes when given explicitly.
/// - `last_signed_in` defaults to `now`, so every call observably bumps it.
pub fn plan_upsert(
    user: &UpsertUser,
    owner_open_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<UpsertPlan, RepositoryError> {
    if user.open_id.is_empty() {
        return Err(RepositoryError::InvalidData(
            "User openId is required for upsert".to_string(),
        ));
    }

    let insert_role = match user.role {
        Some(role) => role,
        None if owner_open_id.is_some_and(|owner| owner == user.open_id) => Role::Admin,
        None => Role::User,
    };

    Ok(UpsertPlan {
        open_id: user.open_id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        login_method: user.login_method.clone(),
        insert_role,
        update_role: user.role,
        last_signed_in: user.last_signed_in.unwrap_or(now),
        now,
    })
}

/// Applies a plan to an optional existing row, producing the stored row.
///
/// `next_id` is only used when the row is created.
pub fn apply_upsert(existing: Option<&User>, plan: &UpsertPlan, next_id: i64) -> User {
    match existing {
        Some(current) => User {
            id: current.id,
            open_id: current.open_id.clone(),
            name: patch(&current.name, &plan.name),
            email: patch(&current.email, &plan.email),
            login_method: patch(&current.login_method, &plan.login_method),
            role: plan.update_role.unwrap_or(current.role),
            created_at: current.created_at,
            updated_at: plan.now,
            last_signed_in: plan.last_signed_in,
        },
        None => User {
            id: next_id,
            open_id: plan.open_id.clone(),
            name: plan.name.clone().flatten(),
            email: plan.email.clone().flatten(),
            login_method: plan.login_method.clone().flatten(),
            role: plan.insert_role,
            created_at: plan.now,
            updated_at: plan.now,
            last_signed_in: plan.last_signed_in,
        },
    }
}

fn patch(current: &Option<String>, field: &Option<Option<String>>) -> Option<String> {
    match field {
        Some(value) => value.clone(),
        None => current.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const OWNER: &str = "owner-open-id";

    fn plan(user: &UpsertUser, now: DateTime<Utc>) -> UpsertPlan {
        plan_upsert(user, Some(OWNER), now).unwrap()
    }

    #[test]
    fn plan_rejects_empty_open_id() {
        let result = plan_upsert(&UpsertUser::new(""), Some(OWNER), Utc::now());
        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[test]
    fn owner_gets_admin_on_first_insert() {
        let now = Utc::now();
        let user = apply_upsert(None, &plan(&UpsertUser::new(OWNER), now), 1);
        assert_eq!(user.role, Role::Admin);
    }

    #[test]
    fn other_identities_get_user_role() {
        let now = Utc::now();
        let user = apply_upsert(None, &plan(&UpsertUser::new("someone"), now), 1);
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn explicit_role_overrides_owner_bootstrap() {
        let now = Utc::now();
        let request = UpsertUser::new(OWNER).with_role(Role::User);
        let user = apply_upsert(None, &plan(&request, now), 1);
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn no_owner_configured_means_user_role() {
        let plan = plan_upsert(&UpsertUser::new(OWNER), None, Utc::now()).unwrap();
        assert_eq!(plan.insert_role, Role::User);
    }

    #[test]
    fn update_keeps_role_unless_explicit() {
        let now = Utc::now();
        let created = apply_upsert(None, &plan(&UpsertUser::new("u1"), now), 7);
        let promoted = apply_upsert(
            Some(&created),
            &plan(&UpsertUser::new("u1").with_role(Role::Admin), now),
            99,
        );
        assert_eq!(promoted.role, Role::Admin);
        assert_eq!(promoted.id, 7);

        let touched = apply_upsert(Some(&promoted), &plan(&UpsertUser::new("u1"), now), 99);
        assert_eq!(touched.role, Role::Admin);
    }

    #[test]
    fn omitted_fields_are_left_unchanged_and_null_clears() {
        let now = Utc::now();
        let request = UpsertUser::new("u1")
            .with_name(Some("Ann".to_string()))
            .with_email(Some("ann@example.com".to_string()));
        let created = apply_upsert(None, &plan(&request, now), 1);

        let request = UpsertUser::new("u1").with_email(None);
        let updated = apply_upsert(Some(&created), &plan(&request, now), 1);

        assert_eq!(updated.name.as_deref(), Some("Ann"));
        assert_eq!(updated.email, None);
    }

    #[test]
    fn last_signed_in_defaults_to_now_on_every_call() {
        let first = Utc::now();
        let second = first + Duration::seconds(5);
        let request = UpsertUser::new("u1").with_name(Some("Ann".to_string()));

        let created = apply_upsert(None, &plan(&request, first), 1);
        let updated = apply_upsert(Some(&created), &plan(&request, second), 1);

        assert_eq!(created.last_signed_in, first);
        assert_eq!(updated.last_signed_in, second);
        assert_eq!(updated.created_at, first);
        assert_eq!(updated.updated_at, second);
    }

    #[test]
    fn explicit_last_signed_in_is_used() {
        let now = Utc::now();
        let at = now - Duration::days(1);
        let plan = plan(&UpsertUser::touch("u1", at), now);
        assert_eq!(plan.last_signed_in, at);
    }

    #[test]
    fn insert_value_flattens_patch() {
        assert_eq!(UpsertPlan::insert_value(&None), None);
        assert_eq!(UpsertPlan::insert_value(&Some(None)), None);
        assert_eq!(
            UpsertPlan::insert_value(&Some(Some("x".to_string()))),
            Some("x")
        );
    }
}
