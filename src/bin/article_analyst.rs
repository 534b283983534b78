use article_analyst::{
    ArticleAnalyst, AssetKind, FileFeedbackStore, MemoryFeedbackStore, Viewport,
};
use serde_json::json;
use std::env;
use std::fs;
use std::path::PathBuf;

const USAGE: &str =
    "usage: article_analyst <page.html> [analysis_data.json] [page_url] [out_dir]";

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("{USAGE}");
        std::process::exit(64);
    }
    let page_path = PathBuf::from(&args[0]);
    let analysis_path = PathBuf::from(
        args.get(1)
            .map(String::as_str)
            .unwrap_or("data/analysis_data.json"),
    );
    let page_url = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "index.html?id=1".to_string());
    let out_dir = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("out"));

    let open_sidebar = env::var("ANALYST_OPEN_SIDEBAR")
        .map(|v| !matches!(v.trim(), "0" | "false" | "no"))
        .unwrap_or(true);
    let viewport = env::var("ANALYST_VIEWPORT")
        .ok()
        .and_then(|v| parse_viewport(&v))
        .unwrap_or_default();

    let mut builder = ArticleAnalyst::builder()
        .analysis_path(&analysis_path)
        .open_sidebar(open_sidebar)
        .viewport(viewport);
    if let Ok(url) = env::var("ANALYST_SIDEBAR_URL") {
        builder = builder.sidebar_url(url);
    }
    if let Ok(path) = env::var("ANALYST_DEBUG_LOG") {
        builder = builder.debug_log(path);
    }
    if let Ok(path) = env::var("ANALYST_PERF_LOG") {
        builder = builder.perf_log(path);
    }
    // ANALYST_ASSETS="image:owl.png,css:brand.css"
    if let Ok(spec) = env::var("ANALYST_ASSETS") {
        for entry in spec.split(',').filter(|e| !e.trim().is_empty()) {
            match parse_asset(entry) {
                Some((kind, path)) => builder = builder.asset_path(path, kind),
                None => eprintln!("[article_analyst][assets] ignoring asset entry {entry:?}"),
            }
        }
    }
    let analyst = match builder.build() {
        Ok(a) => a,
        Err(err) => {
            eprintln!("configuration failed: {}", err);
            std::process::exit(1);
        }
    };

    let html = match fs::read_to_string(&page_path) {
        Ok(h) => h,
        Err(err) => {
            eprintln!("failed to read {}: {}", page_path.display(), err);
            std::process::exit(2);
        }
    };
    let render = match analyst.render_host_page(&html, &page_url) {
        Ok(r) => r,
        Err(err) => {
            eprintln!("render failed: {}", err);
            std::process::exit(3);
        }
    };

    if let Err(err) = fs::create_dir_all(&out_dir) {
        eprintln!("failed to create {}: {}", out_dir.display(), err);
        std::process::exit(4);
    }
    let feedback_path = out_dir.join("feedback.json");
    let sidebar = match FileFeedbackStore::open(&feedback_path) {
        Ok(store) => analyst.render_sidebar(&render.article_id, &store),
        Err(err) => {
            eprintln!(
                "[article_analyst][feedback] ignoring {}: {}",
                feedback_path.display(),
                err
            );
            analyst.render_sidebar(&render.article_id, &MemoryFeedbackStore::new())
        }
    };

    let page_out = out_dir.join("page.html");
    let sidebar_out = out_dir.join("sidebar.html");
    for (path, body) in [(&page_out, &render.html), (&sidebar_out, &sidebar)] {
        if let Err(err) = fs::write(path, body) {
            eprintln!("failed to write {}: {}", path.display(), err);
            std::process::exit(4);
        }
    }
    analyst.flush();

    let summary = json!({
        "article_id": render.article_id,
        "sidebar_open": render.sidebar_open,
        "targets": render.highlights.as_ref().map(|s| s.targets),
        "markers": render.highlights.as_ref().map(|s| s.markers),
        "missed": render
            .highlights
            .as_ref()
            .map(|s| s.missed.iter().map(|t| t.text.clone()).collect::<Vec<_>>())
            .unwrap_or_default(),
        "page": page_out.display().to_string(),
        "sidebar": sidebar_out.display().to_string(),
        "sha256": render.sha256,
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("failed to encode summary: {}", err),
    }
}

// "WIDTHxHEIGHT", e.g. "375x812".
fn parse_viewport(raw: &str) -> Option<Viewport> {
    let (w, h) = raw.trim().split_once(['x', 'X'])?;
    Some(Viewport::new(w.trim().parse().ok()?, h.trim().parse().ok()?))
}

fn parse_asset(entry: &str) -> Option<(AssetKind, PathBuf)> {
    let (kind, path) = entry.trim().split_once(':')?;
    let kind = AssetKind::from_str(kind)?;
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    Some((kind, PathBuf::from(path)))
}
