// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE_LARGE: i64 = 200;

// ---
// Parâmetros de listagem comuns a todos os endpoints
// ---
// Aceita tanto `page`/`page_size` quanto `limit`/`offset`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Página (começa em 1).
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Quando presente, tem precedência sobre `page`/`page_size`.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub sort_by: Option<String>,
    /// `asc` ou `desc`.
    pub order: Option<String>,
    /// Inclui registros com soft delete.
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
    pub offset: i64,
}

impl PageQuery {
    pub fn resolve(&self, max_page_size: i64) -> PageRequest {
        let clamp = |size: i64| size.clamp(1, max_page_size);

        if let Some(limit) = self.limit {
            let page_size = clamp(limit);
            let offset = self.offset.unwrap_or(0).max(0);
            return PageRequest {
                page: offset / page_size + 1,
                page_size,
                offset,
            };
        }

        let page = self.page.unwrap_or(1).max(1);
        let page_size = clamp(self.page_size.unwrap_or(DEFAULT_PAGE_SIZE));
        PageRequest {
            page,
            page_size,
            offset: (page - 1).saturating_mul(page_size),
        }
    }
}

impl PageRequest {
    pub fn meta(&self, total: i64) -> Pagination {
        let total_pages = if total <= 0 {
            0
        } else {
            (total + self.page_size - 1) / self.page_size
        };
        Pagination {
            page: self.page,
            page_size: self.page_size,
            total,
            total_pages,
        }
    }
}

/// Uma página de resultados como o repositório devolve.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    #[schema(example = 1)]
    pub page: i64,
    #[schema(example = 20)]
    pub page_size: i64,
    #[schema(example = 57)]
    pub total: i64,
    #[schema(example = 3)]
    pub total_pages: i64,
}

// ---
// Envelopes de resposta
// ---
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub message: String,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> ListResponse<T> {
    pub fn new(message: String, page: Page<T>, request: PageRequest) -> Self {
        Self {
            message,
            pagination: request.meta(page.total),
            data: page.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(message: String, data: T) -> Self {
        Self { message, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, page_size: Option<i64>) -> PageQuery {
        PageQuery { page, page_size, ..Default::default() }
    }

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let req = PageQuery::default().resolve(MAX_PAGE_SIZE);
        assert_eq!(req, PageRequest { page: 1, page_size: 20, offset: 0 });
    }

    #[test]
    fn clamps_page_size_and_page() {
        assert_eq!(query(Some(0), Some(1000)).resolve(MAX_PAGE_SIZE).page_size, 100);
        assert_eq!(query(Some(-3), Some(0)).resolve(MAX_PAGE_SIZE).page, 1);
        assert_eq!(query(None, Some(500)).resolve(MAX_PAGE_SIZE_LARGE).page_size, 200);
        assert_eq!(query(Some(3), Some(10)).resolve(MAX_PAGE_SIZE).offset, 20);
    }

    #[test]
    fn limit_offset_takes_precedence() {
        let q = PageQuery {
            page: Some(7),
            limit: Some(25),
            offset: Some(50),
            ..Default::default()
        };
        assert_eq!(q.resolve(MAX_PAGE_SIZE), PageRequest { page: 3, page_size: 25, offset: 50 });
    }

    #[test]
    fn total_pages_rounds_up() {
        let req = query(Some(1), Some(20)).resolve(MAX_PAGE_SIZE);
        assert_eq!(req.meta(0).total_pages, 0);
        assert_eq!(req.meta(20).total_pages, 1);
        assert_eq!(req.meta(41).total_pages, 3);
    }

    #[test]
    fn iterating_pages_covers_total_exactly_once() {
        // Sem banco: simula as linhas filtradas e percorre todas as páginas.
        let rows: Vec<i64> = (0..47).collect();
        let first = query(Some(1), Some(10)).resolve(MAX_PAGE_SIZE);
        let meta = first.meta(rows.len() as i64);

        let mut seen = Vec::new();
        for page in 1..=meta.total_pages {
            let req = query(Some(page), Some(10)).resolve(MAX_PAGE_SIZE);
            let start = req.offset as usize;
            let end = (start + req.page_size as usize).min(rows.len());
            seen.extend_from_slice(&rows[start..end]);
        }

        assert_eq!(seen.len() as i64, meta.total);
        assert_eq!(seen, rows);
    }
}
