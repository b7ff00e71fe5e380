use crate::app::{AppContext, LecternError, Result};
use crate::domain::{Chapter, NavigationOutcome};
use crate::navigator::{update_browser_history, HydratingCallback};
use crate::store::ChapterStore;

pub async fn open(ctx: &AppContext, url: &str) -> Result<()> {
    let session = ctx.session_snapshot();

    let result = ctx
        .navigator
        .handle_navigate(url, &session, ctx.hydrator.as_ref())
        .await;

    match result.outcome {
        NavigationOutcome::MemoryHit | NavigationOutcome::StoreHit => {
            ctx.commit(|s| s.absorb_navigation(&result));
            if let (Some(chapter), Some(id)) = (&result.chapter, &result.chapter_id) {
                if result.should_update_browser_history {
                    update_browser_history(ctx.history.as_ref(), chapter, id);
                }
                print_chapter(chapter);
            }
            Ok(())
        }
        NavigationOutcome::NeedsFetch => {
            println!("Fetching {url}...");
            let outcome = ctx.fetcher.handle_fetch(url).await?;
            if let Some(error) = &outcome.error {
                eprintln!("Fetch failed: {error}");
                return Ok(());
            }
            ctx.commit(|s| s.absorb_fetch(&outcome));

            let session = ctx.session_snapshot();
            let result = ctx
                .navigator
                .handle_navigate(url, &session, ctx.hydrator.as_ref())
                .await;
            ctx.commit(|s| s.absorb_navigation(&result));
            match (&result.chapter, &result.chapter_id) {
                (Some(chapter), Some(id)) => {
                    if result.should_update_browser_history {
                        update_browser_history(ctx.history.as_ref(), chapter, id);
                    }
                    print_chapter(chapter);
                    Ok(())
                }
                _ => Err(LecternError::ChapterNotFound(url.to_string())),
            }
        }
        NavigationOutcome::Unsupported | NavigationOutcome::Malformed => {
            eprintln!(
                "{}",
                result.error.unwrap_or_else(|| "Navigation failed".into())
            );
            Ok(())
        }
    }
}

pub async fn fetch(ctx: &AppContext, url: &str) -> Result<()> {
    let outcome = ctx.fetcher.handle_fetch(url).await?;
    if let Some(error) = &outcome.error {
        eprintln!("Fetch failed: {error}");
        return Ok(());
    }
    println!("Imported {} chapter(s)", outcome.chapters.len());
    if let Some(id) = &outcome.current_chapter_id {
        if let Some(chapter) = outcome.chapters.get(id) {
            println!("Current: {} ({})", chapter.display_title(), short_id(id));
        } else {
            println!("Current: {}", short_id(id));
        }
    }
    Ok(())
}

pub async fn show(ctx: &AppContext, stable_id: &str) -> Result<()> {
    let chapter = match ctx.store.get_chapter_by_stable_id(stable_id)? {
        Some(chapter) => Some(chapter),
        // Allow a unique ID prefix for convenience
        None => {
            let mut matches: Vec<Chapter> = ctx
                .store
                .list_chapters()?
                .into_iter()
                .filter(|c| c.stable_id.starts_with(stable_id))
                .collect();
            if matches.len() > 1 {
                return Err(LecternError::Other(format!(
                    "Ambiguous ID prefix: {stable_id}"
                )));
            }
            matches.pop()
        }
    };

    let Some(chapter) = chapter else {
        return Err(LecternError::ChapterNotFound(stable_id.to_string()));
    };

    let noop: HydratingCallback = std::sync::Arc::new(|_, _| {});
    let hydrated = ctx
        .hydrator
        .load_chapter_from_store(&chapter.stable_id, &noop)
        .await;
    print_chapter(&hydrated.map(|h| h.chapter).unwrap_or(chapter));
    Ok(())
}

pub fn list(ctx: &AppContext) -> Result<()> {
    let chapters = ctx.store.list_chapters()?;
    if chapters.is_empty() {
        println!("No chapters in the library");
        return Ok(());
    }

    for chapter in chapters {
        let number = chapter
            .chapter_number
            .map(|n| format!("#{n} "))
            .unwrap_or_default();
        println!(
            "{}  {}{} [{}]",
            short_id(&chapter.stable_id),
            number,
            chapter.display_title(),
            chapter.import_source.source_name,
        );
    }
    Ok(())
}

pub fn sites(ctx: &AppContext) -> Result<()> {
    for site in ctx.provider.supported_sites() {
        println!("{}  e.g. {}", site.domain, site.example);
    }
    Ok(())
}

fn print_chapter(chapter: &Chapter) {
    println!("{}", chapter.display_title());
    println!("{}", chapter.canonical_url);
    println!();
    println!("{}", chapter.content);
    if let Some(translation) = &chapter.translation_result {
        println!();
        println!(
            "--- translation v{} ({} / {}) ---",
            translation.version, translation.usage.provider, translation.usage.model
        );
        println!("{}", translation.translation);
        for footnote in &translation.footnotes {
            println!("  [note] {footnote}");
        }
    }
}

fn short_id(stable_id: &str) -> &str {
    &stable_id[..stable_id.len().min(12)]
}
