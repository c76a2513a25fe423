// Example: Basic usage of the tsundoku-core library
use std::fs;
use std::time::Duration;

use tsundoku_core::models::*;
use tsundoku_core::storage::UserRepository;
use tsundoku_core::*;

fn main() -> anyhow::Result<()> {
    let db_path = "basic_usage_tsundoku.db";
    fs::remove_file(db_path).ok(); // Clean up previous run

    println!("--- Basic Usage of tsundoku-core ---");

    // ========== Database ==========
    println!("\n1. Creating database...");
    let db = Database::new(db_path);
    let conn = db.create()?;
    println!("   ✓ Database created with schema version {}", db.get_schema_version(&conn)?);

    let alice = User::new(1, "alice".to_string());
    UserRepository::upsert(&conn, &alice)?;
    let bob = User::new(2, "bob".to_string());
    UserRepository::upsert(&conn, &bob)?;
    println!("   ✓ Users: {}, {}", alice.username, bob.username);

    // ========== Catalog ==========
    println!("\n2. Filling the catalog...");
    let favorites = RankedFavoriteStore::new(db.clone(), Duration::from_secs(5));
    let catalog = ContentCatalog::new(db.clone()).with_listener(std::sync::Arc::new(favorites.clone()));

    let mut comics = Vec::new();
    for (title, author) in [("Berserk", "Kentaro Miura"), ("Vagabond", "Takehiko Inoue"), ("Monster", "Naoki Urasawa")] {
        let mut request = NewContent::new(title, author, "manga");
        request.genres = vec!["Seinen".to_string()];
        request.total_chapters = 100;
        let comic = catalog.create_content(TargetKind::Comic, &request)?;
        println!("   ✓ Comic #{}: {}", comic.id, comic.title);
        comics.push(comic);
    }
    let novel = catalog.create_content(TargetKind::Novel, &NewContent::new("Spice and Wolf", "Isuna Hasekura", "light novel"))?;
    println!("   ✓ Novel #{}: {}", novel.id, novel.title);

    // ========== Favorites ==========
    println!("\n3. Ranking favorites...");
    let mut ids = Vec::new();
    for comic in &comics {
        let favorite = favorites.create(alice.id, &NewFavorite::comic(comic.id))?;
        ids.push(favorite.id);
    }
    favorites.create(alice.id, &NewFavorite::novel(novel.id))?;
    print_favorites(&favorites, alice.id)?;

    println!("\n4. Moving '{}' to the top...", comics[2].title);
    favorites.move_to(alice.id, ids[2], 1)?;
    print_favorites(&favorites, alice.id)?;

    println!("\n5. Reordering in one batch...");
    let count = favorites.bulk_reorder(
        alice.id,
        &[RankAssignment { id: ids[0], rank: 1 }, RankAssignment { id: ids[2], rank: 2 }, RankAssignment { id: ids[1], rank: 3 }],
    )?;
    println!("   ✓ {} favorites reordered", count);
    print_favorites(&favorites, alice.id)?;

    println!("\n6. Bob tries to delete Alice's favorite...");
    match favorites.delete(bob.id, ids[0]) {
        Err(Error::PermissionDenied(msg)) => println!("   ✓ Refused: {}", msg),
        other => println!("   ✗ Unexpected: {:?}", other),
    }

    println!("\n7. Deleting '{}' from the catalog...", comics[1].title);
    catalog.delete_content(TargetKind::Comic, comics[1].id)?;
    print_favorites(&favorites, alice.id)?;

    // ========== Reviews ==========
    println!("\n8. Reviews and likes...");
    let reviews = ReviewStore::new(db.clone());
    let review = reviews.create(
        alice.id,
        &NewReview {
            comic: Some(comics[0].id),
            novel: None,
            content: "Relentless and beautiful.".to_string(),
            rating: 9.5,
        },
    )?;
    println!("   ✓ Review #{} rated {}", review.id, review.rating);
    let toggle = reviews.toggle_like(bob.id, review.id)?;
    println!("   ✓ Bob liked it: {} like(s)", toggle.likes_count);
    let rated = catalog.get_content(TargetKind::Comic, comics[0].id)?;
    println!("   ✓ Average rating of {}: {}", rated.title, rated.average_rating);

    // ========== Library ==========
    println!("\n9. Reading progress...");
    let library = LibraryTracker::new(db.clone());
    let entry = library.create(
        alice.id,
        &NewLibraryEntry {
            comic: Some(comics[0].id),
            status: Some(ReadingStatus::Reading),
            progress: Some(40),
            ..NewLibraryEntry::default()
        },
    )?;
    println!("   ✓ {} at {:.1}%", entry.target, entry.completion_percentage());
    let entry = library.update(
        alice.id,
        entry.id,
        &LibraryUpdate {
            progress: Some(100),
            ..LibraryUpdate::default()
        },
    )?;
    println!("   ✓ Caught up: {}", entry.is_caught_up());

    let stats = library.stats(alice.id)?;
    println!("   ✓ {} entries, average completion {:.2}%", stats.total, stats.avg_completion);

    let catalog_stats = catalog.stats()?;
    println!(
        "\n   Catalog: {} comics, {} novels, {} genres, {} reviews",
        catalog_stats.total_comics, catalog_stats.total_novels, catalog_stats.total_genres, catalog_stats.total_reviews
    );

    fs::remove_file(db_path).ok();
    println!("\n--- Done ---");
    Ok(())
}

fn print_favorites(favorites: &RankedFavoriteStore, owner: i64) -> Result<()> {
    for favorite in favorites.list(owner, None)? {
        println!("   {:>2}. {}", favorite.rank, favorite.target);
    }
    Ok(())
}
