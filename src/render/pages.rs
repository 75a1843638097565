//! One handler per route.
//!
//! Every HTML page gets the `config` table as `config`; the rest of the
//! payload depends on the route.

use super::{Page, PageKind, RenderError, Route};
use crate::{
    context::SiteContext,
    data::format::{Paper, format_paper, format_workshop},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::{fs, io::ErrorKind};
use tera::Context;

/// Render `route` against the context's data snapshot.
pub fn render(site: &SiteContext, route: &Route) -> Result<Page, RenderError> {
    let data = site.data();
    let mut context = Context::new();

    let template = match route {
        Route::PapersJson => return json_page(route, &formatted_papers(site)),
        Route::ServeTable(name) => {
            let table = data
                .table(name)
                .ok_or_else(|| RenderError::UnknownTable(name.clone()))?;
            return json_page(route, table);
        }
        Route::Home => {
            context.insert("readme", &readme(site)?);
            context.insert("committee", &data.nested_list("committee", "committee"));
            "index.html"
        }
        Route::Help => {
            context.insert("FAQ", &data.nested_list("faq", "FAQ"));
            "help.html"
        }
        Route::Papers => {
            context.insert("papers", &whole_table(site, "papers"));
            "papers.html"
        }
        Route::PaperVis => "papers_vis.html",
        Route::Schedule => {
            let highlighted: Vec<Paper> = data.highlighted_papers().map(format_paper).collect();
            let day = json!({
                "speakers": whole_table(site, "speakers"),
                "highlighted": highlighted,
            });
            context.insert("day", &day);
            "schedule.html"
        }
        Route::Workshops => {
            let workshops: Vec<_> = data.workshops().iter().map(format_workshop).collect();
            context.insert("workshops", &workshops);
            "workshops.html"
        }
        Route::Chat => "chat.html",
        Route::Poster(uid) => {
            let paper = data.papers().get(uid).ok_or_else(|| not_found("papers", uid))?;
            context.insert("paper", &format_paper(paper));
            "poster.html"
        }
        Route::Speaker(uid) => {
            let speaker = data
                .record("speakers", uid)
                .ok_or_else(|| not_found("speakers", uid))?;
            context.insert("speaker", speaker);
            "speaker.html"
        }
        Route::Workshop(uid) => {
            let workshop = data
                .workshops()
                .get(uid)
                .ok_or_else(|| not_found("workshops", uid))?;
            context.insert("workshop", &format_workshop(workshop));
            "workshop.html"
        }
    };

    context.insert("config", &data.site_config());
    let body = site.renderer().render(template, &context)?.into_bytes();
    Ok(Page {
        kind: PageKind::Html,
        body,
    })
}

fn json_page<T: Serialize + ?Sized>(route: &Route, value: &T) -> Result<Page, RenderError> {
    Ok(Page {
        kind: route.kind(),
        body: serde_json::to_vec(value)?,
    })
}

fn whole_table(site: &SiteContext, name: &str) -> Value {
    site.data()
        .table(name)
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()))
}

fn formatted_papers(site: &SiteContext) -> Vec<Paper> {
    site.data().papers().iter().map(format_paper).collect()
}

/// README text for the home page; a missing file renders as nothing.
fn readme(site: &SiteContext) -> Result<String, RenderError> {
    let path = &site.config().site.readme;
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(RenderError::Io(path.clone(), err)),
    }
}

fn not_found(table: &'static str, uid: &str) -> RenderError {
    RenderError::NotFound {
        table,
        uid: uid.to_owned(),
    }
}
