// src/common/query.rs

// Peças reutilizadas pelos repositórios para montar listagens com `QueryBuilder`:
// escopo (tenant + soft delete), busca textual e ordenação por allow-list.

use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::common::pagination::{Page, PageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl OrderBy {
    pub const DEFAULT: OrderBy = OrderBy {
        column: "created_at",
        direction: SortDirection::Desc,
    };

    /// Resolve a chave enviada pelo cliente contra a allow-list `(chave, coluna)`.
    /// Chave desconhecida ou ausente cai no padrão `created_at DESC`.
    pub fn resolve(
        allowed: &[(&'static str, &'static str)],
        sort_by: Option<&str>,
        order: Option<&str>,
    ) -> OrderBy {
        let Some(key) = sort_by.map(str::trim).filter(|k| !k.is_empty()) else {
            return Self::DEFAULT;
        };

        let Some((_, column)) = allowed.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)) else {
            return Self::DEFAULT;
        };

        let direction = match order.map(|o| o.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        };

        OrderBy { column: *column, direction }
    }

    /// Sempre desempata por `id` para a paginação ser estável.
    pub fn push_to(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let dir = self.direction.as_sql();
        qb.push(format!(" ORDER BY {} {dir}, id {dir}", self.column));
    }
}

/// `%termo%` em minúsculas com `%`, `_` e `\` escapados. Busca vazia vira `None`.
pub fn search_pattern(term: Option<&str>) -> Option<String> {
    let term = term?.trim();
    if term.is_empty() {
        return None;
    }

    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    Some(escaped)
}

/// `WHERE <coluna_tenant> = $1 [AND deleted_at IS NULL]`. Sempre o primeiro filtro.
pub fn push_scope(
    qb: &mut QueryBuilder<'_, Postgres>,
    tenant_column: &str,
    tenant_id: Uuid,
    include_deleted: bool,
) {
    qb.push(format!(" WHERE {tenant_column} = "));
    qb.push_bind(tenant_id);
    if !include_deleted {
        qb.push(" AND deleted_at IS NULL");
    }
}

/// `AND (LOWER(c1) LIKE $n ESCAPE '\' OR LOWER(c2) LIKE $n ...)`
pub fn push_search(qb: &mut QueryBuilder<'_, Postgres>, columns: &[&str], pattern: &str) {
    if columns.is_empty() {
        return;
    }
    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(format!("LOWER({column}) LIKE "));
        qb.push_bind(pattern.to_string());
        qb.push(" ESCAPE '\\'");
    }
    qb.push(")");
}

pub fn push_limit_offset(qb: &mut QueryBuilder<'_, Postgres>, limit: i64, offset: i64) {
    qb.push(" LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
}

/// Conta e busca uma página de `table` aplicando os mesmos filtros nas duas consultas,
/// para que `total` sempre corresponda às linhas percorridas página a página.
pub async fn fetch_page<T, F>(
    pool: &PgPool,
    table: &str,
    order: OrderBy,
    request: PageRequest,
    push_filters: F,
) -> Result<Page<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    F: for<'q> Fn(&mut QueryBuilder<'q, Postgres>),
{
    let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {table}"));
    push_filters(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {table}"));
    push_filters(&mut select);
    order.push_to(&mut select);
    push_limit_offset(&mut select, request.page_size, request.offset);
    let items = select.build_query_as::<T>().fetch_all(pool).await?;

    Ok(Page { items, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[(&str, &str)] = &[
        ("created_at", "created_at"),
        ("amount", "amount"),
        ("name", "donor_name"),
    ];

    #[test]
    fn resolves_allowed_keys() {
        let order = OrderBy::resolve(ALLOWED, Some("name"), Some("ASC"));
        assert_eq!(order, OrderBy { column: "donor_name", direction: SortDirection::Asc });

        let order = OrderBy::resolve(ALLOWED, Some("Amount"), None);
        assert_eq!(order, OrderBy { column: "amount", direction: SortDirection::Desc });
    }

    #[test]
    fn unknown_or_missing_key_falls_back_to_default() {
        assert_eq!(OrderBy::resolve(ALLOWED, Some("password_hash"), Some("asc")), OrderBy::DEFAULT);
        assert_eq!(OrderBy::resolve(ALLOWED, None, Some("asc")), OrderBy::DEFAULT);
        assert_eq!(OrderBy::resolve(ALLOWED, Some("  "), None), OrderBy::DEFAULT);
    }

    #[test]
    fn order_by_sql_has_stable_tiebreaker() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM donations");
        OrderBy::resolve(ALLOWED, Some("amount"), Some("asc")).push_to(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM donations ORDER BY amount ASC, id ASC");
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(search_pattern(Some("  Al-Falah ")), Some("%al-falah%".to_string()));
        assert_eq!(search_pattern(Some("100%_off")), Some("%100\\%\\_off%".to_string()));
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(None), None);
    }

    #[test]
    fn scope_and_search_build_expected_sql() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        push_scope(&mut qb, "masjid_id", Uuid::nil(), false);
        push_search(&mut qb, &["name", "code"], "%a%");

        assert_eq!(
            qb.sql(),
            "SELECT * FROM t WHERE masjid_id = $1 AND deleted_at IS NULL \
             AND (LOWER(name) LIKE $2 ESCAPE '\\' OR LOWER(code) LIKE $3 ESCAPE '\\')"
        );
    }

    #[test]
    fn include_deleted_drops_soft_delete_filter() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        push_scope(&mut qb, "user_id", Uuid::nil(), true);
        assert_eq!(qb.sql(), "SELECT * FROM t WHERE user_id = $1");
    }
}
