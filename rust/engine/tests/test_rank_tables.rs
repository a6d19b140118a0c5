// Installing a loader is process-wide, so this file holds a single test.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use varipoker_engine::cards::parse_cards;
use varipoker_engine::hand::{evaluate, Category, EvalType};
use varipoker_engine::lookup::{self, GeneratedTables, RankTable, TableLoader};

struct Counting {
    loads: Arc<AtomicUsize>,
}

impl TableLoader for Counting {
    fn load(&self, eval: EvalType) -> RankTable {
        self.loads.fetch_add(1, Ordering::SeqCst);
        GeneratedTables.load(eval)
    }
}

#[test]
fn installed_loader_builds_each_table_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let installed = lookup::install_loader(Box::new(Counting {
        loads: Arc::clone(&loads),
    }));
    assert!(installed.is_ok());
    assert!(lookup::install_loader(Box::new(GeneratedTables)).is_err());

    let flush = parse_cards("Ah 9h 7h 4h 2h").unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let flush = flush.clone();
            std::thread::spawn(move || evaluate(&flush, EvalType::High))
        })
        .collect();
    for h in handles {
        let rank = h.join().unwrap().unwrap();
        assert_eq!(rank.category, Category::Flush);
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    evaluate(&flush, EvalType::A5Low).unwrap();
    evaluate(&flush, EvalType::High).unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);

    // policies without a table never touch the loader
    evaluate(&flush, EvalType::Pip49).unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}
