//! In-memory backend serving fixed HTML documents.
//!
//! Pages are looked up by exact URL. Clicking an element that carries an
//! `href` or `data-navigate` attribute loads that URL; every other
//! interaction is only recorded. Nothing ever waits, so a missing element
//! fails immediately with the error a real browser would eventually report.

use super::{RenderBackend, RowHandle};
use crate::error::BackendError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Default)]
pub struct SnapshotBackend {
    pages: HashMap<String, String>,
    document: Option<Html>,
    /// URLs loaded, in order.
    pub visited: Vec<String>,
    /// `(selector, text)` pairs typed into inputs.
    pub typed: Vec<(String, String)>,
    /// `(selector, label)` pairs chosen in selects.
    pub selected: Vec<(String, String)>,
    /// Selectors clicked, row clicks included.
    pub clicked: Vec<String>,
}

impl SnapshotBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url`.
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    fn document(&self) -> Result<&Html, BackendError> {
        self.document
            .as_ref()
            .ok_or_else(|| BackendError::Browser("no page loaded".to_string()))
    }

    fn find(&self, selector: &str) -> Result<ElementRef<'_>, BackendError> {
        let parsed = parse(selector)?;
        self.document()?
            .select(&parsed)
            .next()
            .ok_or_else(|| not_found(selector))
    }

    fn find_in_row(&self, row: &RowHandle, selector: &str) -> Result<ElementRef<'_>, BackendError> {
        let list = parse(row.list_selector())?;
        let row_el = self
            .document()?
            .select(&list)
            .nth(row.index())
            .ok_or_else(|| BackendError::StaleRow {
                selector: row.list_selector().to_string(),
                index: row.index(),
            })?;
        let inner = parse(selector)?;
        row_el.select(&inner).next().ok_or_else(|| not_found(selector))
    }

    async fn follow(&mut self, target: Option<String>) -> Result<(), BackendError> {
        match target {
            Some(url) => self.navigate(&url).await,
            None => Ok(()),
        }
    }
}

fn parse(selector: &str) -> Result<Selector, BackendError> {
    Selector::parse(selector)
        .map_err(|e| BackendError::Browser(format!("invalid selector `{selector}`: {e}")))
}

fn not_found(selector: &str) -> BackendError {
    BackendError::NotFound {
        selector: selector.to_string(),
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn link_of(el: ElementRef<'_>) -> Option<String> {
    el.value()
        .attr("href")
        .or_else(|| el.value().attr("data-navigate"))
        .map(str::to_string)
}

impl RenderBackend for SnapshotBackend {
    async fn navigate(&mut self, url: &str) -> Result<(), BackendError> {
        let html = self
            .pages
            .get(url)
            .ok_or_else(|| BackendError::Navigation {
                url: url.to_string(),
                reason: "no snapshot for this URL".to_string(),
            })?;
        self.document = Some(Html::parse_document(html));
        self.visited.push(url.to_string());
        Ok(())
    }

    async fn wait_until_visible(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BackendError> {
        self.find(selector).map(|_| ()).map_err(|_| BackendError::Timeout {
            op: "wait_until_visible",
            selector: selector.to_string(),
            timeout,
        })
    }

    async fn click(&mut self, selector: &str) -> Result<(), BackendError> {
        let target = link_of(self.find(selector)?);
        self.clicked.push(selector.to_string());
        self.follow(target).await
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BackendError> {
        let el = self.find(selector)?;
        if !matches!(el.value().name(), "input" | "textarea") {
            return Err(BackendError::Unsupported {
                selector: selector.to_string(),
                action: "accept text",
            });
        }
        self.typed.push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn get_text(&mut self, selector: &str) -> Result<String, BackendError> {
        self.find(selector).map(text_of)
    }

    async fn get_attribute(
        &mut self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        Ok(self.find(selector)?.value().attr(name).map(str::to_string))
    }

    async fn list_elements(&mut self, selector: &str) -> Result<Vec<RowHandle>, BackendError> {
        let parsed = parse(selector)?;
        let count = self.document()?.select(&parsed).count();
        Ok((0..count).map(|i| RowHandle::new(selector, i)).collect())
    }

    async fn select_by_label(&mut self, selector: &str, label: &str) -> Result<(), BackendError> {
        let select = self.find(selector)?;
        let option = parse("option")?;
        if !select.select(&option).any(|o| text_of(o) == label) {
            return Err(not_found(&format!("{selector} option[label={label}]")));
        }
        self.selected.push((selector.to_string(), label.to_string()));
        Ok(())
    }

    async fn row_text(&mut self, row: &RowHandle, selector: &str) -> Result<String, BackendError> {
        self.find_in_row(row, selector).map(text_of)
    }

    async fn row_attribute(
        &mut self,
        row: &RowHandle,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        Ok(self
            .find_in_row(row, selector)?
            .value()
            .attr(name)
            .map(str::to_string))
    }

    async fn row_click(&mut self, row: &RowHandle, selector: &str) -> Result<(), BackendError> {
        let target = link_of(self.find_in_row(row, selector)?);
        self.clicked
            .push(format!("{}[{}] {selector}", row.list_selector(), row.index()));
        self.follow(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <a id="next" href="page-2">Next</a>
          <ul class="menu">
            <li><h3>First</h3><img src="one.jpg"></li>
            <li><h3>Second</h3></li>
          </ul>
          <select class="sort"><option>Relevance</option><option>Newest</option></select>
        </body></html>
    "#;

    fn backend() -> SnapshotBackend {
        SnapshotBackend::new()
            .with_page("page-1", PAGE)
            .with_page("page-2", "<html><body><p>Two</p></body></html>")
    }

    #[tokio::test]
    async fn test_rows_and_fields() {
        let mut b = backend();
        b.navigate("page-1").await.unwrap();

        let rows = b.list_elements("ul.menu > li").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(b.row_text(&rows[1], "h3").await.unwrap(), "Second");
        assert_eq!(
            b.row_attribute(&rows[0], "img", "src").await.unwrap(),
            Some("one.jpg".to_string())
        );
        assert!(matches!(
            b.row_attribute(&rows[1], "img", "src").await,
            Err(BackendError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_click_follows_links() {
        let mut b = backend();
        b.navigate("page-1").await.unwrap();
        b.click("#next").await.unwrap();
        assert_eq!(b.get_text("p").await.unwrap(), "Two");
        assert_eq!(b.visited, vec!["page-1", "page-2"]);
    }

    #[tokio::test]
    async fn test_select_by_label() {
        let mut b = backend();
        b.navigate("page-1").await.unwrap();
        b.select_by_label("select.sort", "Newest").await.unwrap();
        assert!(b.select_by_label("select.sort", "Oldest").await.is_err());
        assert_eq!(b.selected.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_element_times_out() {
        let mut b = backend();
        b.navigate("page-1").await.unwrap();
        let err = b
            .wait_until_visible(".absent", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout { .. }));
    }
}
