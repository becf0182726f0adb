use serde::Deserialize;
use shared::{Page, VideoInfo};

use crate::db::{Client, Comment, Media, Organization, Testimonial, Volunteer};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

/// `?search=&sortBy=&order=&page=&pageSize=` accepted by list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<SortOrder>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Comparable value of one field; variants order before each other as declared
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Missing,
    Number(i64),
    Text(String),
}

impl SortKey {
    fn text(value: &str) -> Self {
        SortKey::Text(value.to_lowercase())
    }

    fn opt_text(value: Option<&str>) -> Self {
        value.map(Self::text).unwrap_or(SortKey::Missing)
    }
}

pub trait Listable {
    /// Fields searched by `?search=`
    fn search_fields(&self) -> Vec<&str>;

    /// `None` when `field` is not sortable for this entity
    fn sort_key(&self, field: &str) -> Option<SortKey>;
}

impl ListQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Filter, sort and slice `items`; `total` counts the filtered set
    pub fn apply<T: Listable>(&self, items: Vec<T>) -> Page<T> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut items: Vec<T> = match needle {
            Some(needle) => items
                .into_iter()
                .filter(|item| {
                    item.search_fields()
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
                })
                .collect(),
            None => items,
        };

        if let Some(field) = self.sort_by.as_deref() {
            let sortable = items.first().map_or(false, |item| item.sort_key(field).is_some());
            if sortable {
                let desc = self.order.unwrap_or_default() == SortOrder::Desc;
                items.sort_by(|a, b| {
                    let ordering = a.sort_key(field).cmp(&b.sort_key(field));
                    if desc {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                });
            }
        }

        let total = items.len();
        let page = self.page();
        let page_size = self.page_size();
        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Page {
            items,
            page,
            page_size,
            total,
        }
    }
}

fn opt(value: &Option<String>) -> Option<&str> {
    value.as_deref()
}

impl Listable for Client {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str(), self.first_name.as_str(), self.last_name.as_str()];
        fields.extend(opt(&self.phone));
        fields.extend(opt(&self.plan));
        fields
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        Some(match field {
            "email" => SortKey::text(&self.email),
            "firstName" => SortKey::text(&self.first_name),
            "lastName" => SortKey::text(&self.last_name),
            "plan" => SortKey::opt_text(opt(&self.plan)),
            "subscriptionStatus" => SortKey::text(&self.subscription_status),
            "trialEndsAt" => self
                .trial_ends_at
                .map(|t| SortKey::Number(t.timestamp()))
                .unwrap_or(SortKey::Missing),
            "createdAt" => SortKey::opt_text(opt(&self.created_at)),
            _ => return None,
        })
    }
}

impl Listable for Organization {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str(), self.name.as_str()];
        fields.extend(opt(&self.contact_person));
        fields.extend(opt(&self.address));
        fields
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        Some(match field {
            "email" => SortKey::text(&self.email),
            "name" => SortKey::text(&self.name),
            "contactPerson" => SortKey::opt_text(opt(&self.contact_person)),
            "createdAt" => SortKey::opt_text(opt(&self.created_at)),
            _ => return None,
        })
    }
}

impl Listable for Volunteer {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str(), self.first_name.as_str(), self.last_name.as_str()];
        fields.extend(opt(&self.phone));
        fields
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        Some(match field {
            "email" => SortKey::text(&self.email),
            "firstName" => SortKey::text(&self.first_name),
            "lastName" => SortKey::text(&self.last_name),
            "createdAt" => SortKey::opt_text(opt(&self.created_at)),
            _ => return None,
        })
    }
}

impl Listable for VideoInfo {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(opt(&self.description));
        fields.extend(opt(&self.location));
        fields
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        Some(match field {
            "title" => SortKey::text(&self.title),
            "location" => SortKey::opt_text(opt(&self.location)),
            "status" => SortKey::text(self.status.as_str()),
            "views" => SortKey::Number(self.views),
            "createdAt" => SortKey::opt_text(opt(&self.created_at)),
            _ => return None,
        })
    }
}

impl Listable for Comment {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.user_name.as_str(), self.comment_text.as_str()]
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        Some(match field {
            "userName" => SortKey::text(&self.user_name),
            "stars" => SortKey::Number(self.stars),
            "createdAt" => SortKey::opt_text(opt(&self.created_at)),
            _ => return None,
        })
    }
}

impl Listable for Media {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(opt(&self.description));
        fields
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        Some(match field {
            "title" => SortKey::text(&self.title),
            "createdAt" => SortKey::opt_text(opt(&self.created_at)),
            _ => return None,
        })
    }
}

impl Listable for Testimonial {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.text.as_str()]
    }

    fn sort_key(&self, field: &str) -> Option<SortKey> {
        Some(match field {
            "name" => SortKey::text(&self.name),
            "createdAt" => SortKey::opt_text(opt(&self.created_at)),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn testimonial(name: &str, text: &str) -> Testimonial {
        Testimonial {
            id: name.to_lowercase(),
            name: name.to_string(),
            text: text.to_string(),
            photo_url: None,
            created_at: None,
        }
    }

    fn sample() -> Vec<Testimonial> {
        vec![
            testimonial("Bram", "Mooie wandeling door de duinen"),
            testimonial("anna", "Heerlijk om thuis te wandelen"),
            testimonial("Cees", "De DUINEN waren prachtig"),
        ]
    }

    fn names(page: &Page<Testimonial>) -> Vec<&str> {
        page.items.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::default();
        let page = query.apply(sample());
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 20);
        assert_eq!(page.total, 3);
        assert_eq!(names(&page), vec!["Bram", "anna", "Cees"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let query = ListQuery {
            search: Some("Duinen".to_string()),
            ..Default::default()
        };
        let page = query.apply(sample());
        assert_eq!(page.total, 2);
        assert_eq!(names(&page), vec!["Bram", "Cees"]);
    }

    #[test]
    fn test_sort_by_name_both_directions() {
        let mut query = ListQuery {
            sort_by: Some("name".to_string()),
            ..Default::default()
        };
        assert_eq!(names(&query.apply(sample())), vec!["anna", "Bram", "Cees"]);

        query.order = Some(SortOrder::Desc);
        assert_eq!(names(&query.apply(sample())), vec!["Cees", "Bram", "anna"]);
    }

    #[test]
    fn test_unknown_sort_field_keeps_order() {
        let query = ListQuery {
            sort_by: Some("favouriteColour".to_string()),
            order: Some(SortOrder::Desc),
            ..Default::default()
        };
        assert_eq!(names(&query.apply(sample())), vec!["Bram", "anna", "Cees"]);
    }

    #[test]
    fn test_pagination_and_clamping() {
        let query = ListQuery {
            page: Some(2),
            page_size: Some(2),
            ..Default::default()
        };
        let page = query.apply(sample());
        assert_eq!(page.total, 3);
        assert_eq!(names(&page), vec!["Cees"]);

        let query = ListQuery {
            page: Some(0),
            page_size: Some(1000),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 100);
        assert_eq!(ListQuery { page_size: Some(0), ..Default::default() }.page_size(), 1);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let query = ListQuery {
            page: Some(5),
            ..Default::default()
        };
        let page = query.apply(sample());
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_query_string_parsing() {
        let query: ListQuery =
            serde_json::from_value(serde_json::json!({"sortBy": "views", "order": "desc", "pageSize": 5}))
                .unwrap();
        assert_eq!(query.sort_by.as_deref(), Some("views"));
        assert_eq!(query.order, Some(SortOrder::Desc));
        assert_eq!(query.page_size(), 5);
    }
}
