use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    DomainResult, PageRequest, Paginated, ProfileUpdate, Role, TargetScope, User, UserRepository,
    UserSummary, UserWithCounts,
};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use uuid::Uuid;

use super::{corrupt, map_db_err, SqliteStore, SummaryRow};

const USER_COLUMNS: &str = "id, name, email, role, bio, avatar_url, created_at";

// Counts are derived on every read so they can never drift from the edge tables.
const USER_WITH_COUNTS_SELECT: &str = "SELECT u.id, u.name, u.email, u.role, u.bio, u.avatar_url, u.created_at, \
     (SELECT COUNT(*) FROM articles a WHERE a.author_id = u.id) AS article_count, \
     (SELECT COUNT(*) FROM followers f WHERE f.followed_id = u.id) AS follower_count, \
     (SELECT COUNT(*) FROM followers f WHERE f.follower_id = u.id) AS following_count \
     FROM users u";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    bio: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = domains::DomainError;

    fn try_from(row: UserRow) -> DomainResult<Self> {
        let role = row.role.parse::<Role>().map_err(|_| corrupt("role", &row.role))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            bio: row.bio,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct UserCountsRow {
    #[sqlx(flatten)]
    user: UserRow,
    article_count: i64,
    follower_count: i64,
    following_count: i64,
}

impl TryFrom<UserCountsRow> for UserWithCounts {
    type Error = domains::DomainError;

    fn try_from(row: UserCountsRow) -> DomainResult<Self> {
        Ok(UserWithCounts {
            user: row.user.try_into()?,
            article_count: row.article_count,
            follower_count: row.follower_count,
            following_count: row.following_count,
        })
    }
}

impl SqliteStore {
    async fn user_summaries(&self, sql: &str, user_id: Uuid) -> DomainResult<Vec<UserSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(UserSummary::from).collect())
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn create(&self, user: User) -> DomainResult<User> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role, bio, avatar_url, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.map(User::try_from).transpose()
    }

    async fn get_with_counts(&self, id: Uuid) -> DomainResult<Option<UserWithCounts>> {
        let sql = format!("{USER_WITH_COUNTS_SELECT} WHERE u.id = ?");
        let row: Option<UserCountsRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.map(UserWithCounts::try_from).transpose()
    }

    async fn list_with_counts(
        &self,
        role: Option<Role>,
        page: PageRequest,
    ) -> DomainResult<Paginated<UserWithCounts>> {
        let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM users u");
        let mut select: QueryBuilder<Sqlite> = QueryBuilder::new(USER_WITH_COUNTS_SELECT);
        if let Some(role) = role {
            count.push(" WHERE u.role = ").push_bind(role.as_str());
            select.push(" WHERE u.role = ").push_bind(role.as_str());
        }
        select
            .push(" ORDER BY u.created_at DESC, u.id DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;
        let rows: Vec<UserCountsRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        let items = rows
            .into_iter()
            .map(UserWithCounts::try_from)
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Paginated::new(items, page, total))
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> DomainResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET name = ?, email = ?, bio = ?, avatar_url = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(update.name)
            .bind(update.email)
            .bind(update.bio)
            .bind(update.avatar_url)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.map(User::try_from).transpose()
    }

    async fn update_role(&self, id: Uuid, role: Role, scope: TargetScope) -> DomainResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = ? WHERE id = ? AND (? OR role <> 'admin') RETURNING {USER_COLUMNS}"
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(role.as_str())
            .bind(id)
            .bind(scope == TargetScope::Any)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.map(User::try_from).transpose()
    }

    async fn delete(&self, id: Uuid, scope: TargetScope) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ? AND (? OR role <> 'admin')")
            .bind(id)
            .bind(scope == TargetScope::Any)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn followers(&self, user_id: Uuid) -> DomainResult<Vec<UserSummary>> {
        self.user_summaries(
            "SELECT u.id, u.name, u.email, u.avatar_url FROM followers f \
             JOIN users u ON u.id = f.follower_id \
             WHERE f.followed_id = ? ORDER BY f.created_at DESC, u.id DESC",
            user_id,
        )
        .await
    }

    async fn following(&self, user_id: Uuid) -> DomainResult<Vec<UserSummary>> {
        self.user_summaries(
            "SELECT u.id, u.name, u.email, u.avatar_url FROM followers f \
             JOIN users u ON u.id = f.followed_id \
             WHERE f.follower_id = ? ORDER BY f.created_at DESC, u.id DESC",
            user_id,
        )
        .await
    }
}
