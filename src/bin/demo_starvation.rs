use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use tunnelcity::tunnel::{BridgeMonitor, TravelerClass};

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("========================================");
    println!("   DEMO: INANICIÓN SIN POLÍTICA DE TURNOS");
    println!("========================================\n");

    let monitor = Arc::new(BridgeMonitor::new());
    let stop = Arc::new(AtomicBool::new(false));
    let relayed = Arc::new(AtomicU64::new(0));

    println!("----------------------------------------");
    println!("FASE 1: un coche al norte ocupa el tunel");
    println!("----------------------------------------");
    monitor.request_entry(TravelerClass::North);
    println!("  estado: {}", monitor.snapshot().occupancy);

    // Relevo: el siguiente coche al norte entra antes de que salga el anterior,
    // así la ocupación norte nunca llega a cero.
    let stream = {
        let monitor = Arc::clone(&monitor);
        let stop = Arc::clone(&stop);
        let relayed = Arc::clone(&relayed);
        thread::Builder::new().name("north-stream".into()).spawn(move || {
            monitor.request_entry(TravelerClass::North);
            while !stop.load(Ordering::SeqCst) {
                monitor.request_entry(TravelerClass::North);
                monitor.release_exit(TravelerClass::North);
                relayed.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
            }
            monitor.release_exit(TravelerClass::North);
        })?
    };

    // el primer coche sale cuando el relevo ya está dentro
    while monitor.occupancy(TravelerClass::North) < 2 {
        thread::sleep(Duration::from_millis(1));
    }
    monitor.release_exit(TravelerClass::North);

    println!("\n----------------------------------------");
    println!("FASE 2: llega un coche al sur y espera");
    println!("----------------------------------------");
    let south = {
        let monitor = Arc::clone(&monitor);
        thread::Builder::new().name("south-1".into()).spawn(move || {
            monitor.request_entry(TravelerClass::South);
            println!("  🚗 coche al sur por fin entra");
            monitor.release_exit(TravelerClass::South);
        })?
    };

    for second in 1..=3 {
        thread::sleep(Duration::from_secs(1));
        let snap = monitor.snapshot();
        println!(
            "  t={second}s ocupación {} | esperando {} | cruces al norte en relevo: {}",
            snap.occupancy,
            snap.waiting,
            relayed.load(Ordering::SeqCst)
        );
    }
    println!("\nEl coche al sur sigue esperando: no hay turnos ni envejecimiento.");

    println!("\n----------------------------------------");
    println!("FASE 3: se corta el flujo hacia el norte");
    println!("----------------------------------------");
    stop.store(true, Ordering::SeqCst);
    if stream.join().is_err() {
        anyhow::bail!("north stream panicked");
    }
    if south.join().is_err() {
        anyhow::bail!("south traveler panicked");
    }

    println!("\n{monitor}");
    println!("Demo terminada.");
    Ok(())
}
