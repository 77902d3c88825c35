//! Escenarios concurrentes sobre el monitor del tunel.
//!
//! 1. Un coche al norte solo entra sin esperar.
//! 2. Dos coches al norte comparten el tunel.
//! 3. Un coche al sur espera a que salga el del norte.
//! 4. Carrera al salir el peatón: entra una sola dirección.
//! 5. Inanición: un flujo continuo al norte deja esperando al sur.
//!
//! Además, una prueba de estrés que revisa la exclusión en todos los
//! estados que el observador vio.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tunnelcity::tunnel::{BridgeEvent, BridgeEventKind, BridgeMonitor, ClassCounts, TravelerClass};

use TravelerClass::{North, Pedestrian, South};

/// Espera activa con tope; devuelve si la condición llegó a cumplirse.
fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

fn recording_monitor() -> (Arc<BridgeMonitor>, Arc<Mutex<Vec<BridgeEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let monitor = BridgeMonitor::with_observer(Arc::new(move |ev: &BridgeEvent| {
        sink.lock().unwrap().push(*ev);
    }));
    (Arc::new(monitor), events)
}

const LONG: Duration = Duration::from_secs(5);

// ============================================================================
// Escenario 1
// ============================================================================

#[test]
fn single_north_enters_immediately() {
    let monitor = BridgeMonitor::new();

    monitor.request_entry(North);
    assert_eq!(monitor.snapshot().occupancy, ClassCounts::new(1, 0, 0));
    assert_eq!(monitor.waiting(North), 0);

    monitor.release_exit(North);
    let snap = monitor.snapshot();
    assert_eq!(snap.occupancy, ClassCounts::new(0, 0, 0));
    assert_eq!(snap.completed[North], 1);
    assert_eq!(snap.completed.total(), 1);
}

// ============================================================================
// Escenario 2
// ============================================================================

#[test]
fn same_direction_shares_the_tunnel() {
    let monitor = Arc::new(BridgeMonitor::new());
    // los dos tienen que estar dentro a la vez para pasar la barrera
    let both_inside = Arc::new(Barrier::new(3));

    let cars: Vec<_> = (0..2)
        .map(|_| {
            let monitor = Arc::clone(&monitor);
            let both_inside = Arc::clone(&both_inside);
            thread::spawn(move || {
                monitor.request_entry(North);
                both_inside.wait();
                monitor.release_exit(North);
            })
        })
        .collect();

    assert!(wait_until(LONG, || monitor.occupancy(North) == 2));
    assert_eq!(monitor.waiting(North), 0);
    both_inside.wait();

    for car in cars {
        car.join().unwrap();
    }
    assert_eq!(monitor.completed(North), 2);
    assert_eq!(monitor.occupancy(North), 0);
}

// ============================================================================
// Escenario 3
// ============================================================================

#[test]
fn opposite_direction_waits_until_tunnel_empties() {
    let (monitor, events) = recording_monitor();
    monitor.request_entry(North);

    let entered = Arc::new(AtomicBool::new(false));
    let south = {
        let monitor = Arc::clone(&monitor);
        let entered = Arc::clone(&entered);
        thread::spawn(move || {
            monitor.request_entry(South);
            entered.store(true, Ordering::SeqCst);
            monitor.release_exit(South);
        })
    };

    assert!(wait_until(LONG, || monitor.waiting(South) == 1));
    thread::sleep(Duration::from_millis(50));
    assert!(!entered.load(Ordering::SeqCst), "south got in while north was inside");
    assert_eq!(monitor.occupancy(South), 0);

    monitor.release_exit(North);
    south.join().unwrap();

    assert!(entered.load(Ordering::SeqCst));
    let snap = monitor.snapshot();
    assert_eq!(snap.completed, ClassCounts::new(1, 1, 0));
    assert_eq!(snap.waiting.total(), 0);

    // el sur se suspende una sola vez, antes de entrar
    let events = events.lock().unwrap();
    let south: Vec<_> = events.iter().filter(|e| e.class == South).map(|e| e.kind).collect();
    assert_eq!(
        south,
        vec![BridgeEventKind::Waiting, BridgeEventKind::Entered, BridgeEventKind::Exited]
    );
    let waiting = events.iter().find(|e| e.kind == BridgeEventKind::Waiting).unwrap();
    assert_eq!(waiting.occupancy, ClassCounts::new(1, 0, 0));
    assert!(events.iter().filter(|e| e.class == North).all(|e| e.kind != BridgeEventKind::Waiting));
}

#[test]
fn pedestrian_waits_behind_a_car_and_vice_versa() {
    let monitor = Arc::new(BridgeMonitor::new());
    monitor.request_entry(Pedestrian);

    let car = {
        let monitor = Arc::clone(&monitor);
        thread::spawn(move || {
            monitor.request_entry(South);
            monitor.release_exit(South);
        })
    };
    assert!(wait_until(LONG, || monitor.waiting(South) == 1));

    // otro peatón no espera al primero
    monitor.request_entry(Pedestrian);
    assert_eq!(monitor.occupancy(Pedestrian), 2);

    monitor.release_exit(Pedestrian);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(monitor.waiting(South), 1, "one pedestrian still inside");

    monitor.release_exit(Pedestrian);
    car.join().unwrap();
    assert_eq!(monitor.snapshot().completed, ClassCounts::new(0, 1, 2));
}

// ============================================================================
// Escenario 4
// ============================================================================

#[test]
fn release_race_admits_one_direction_at_a_time() {
    let (monitor, events) = recording_monitor();
    monitor.request_entry(Pedestrian);

    let cars: Vec<_> = [North, South]
        .into_iter()
        .map(|class| {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                monitor.request_entry(class);
                thread::sleep(Duration::from_millis(30));
                monitor.release_exit(class);
            })
        })
        .collect();

    assert!(wait_until(LONG, || {
        let snap = monitor.snapshot();
        snap.waiting[North] == 1 && snap.waiting[South] == 1
    }));

    monitor.release_exit(Pedestrian);
    for car in cars {
        car.join().unwrap();
    }

    let events = events.lock().unwrap();
    for ev in events.iter() {
        assert!(
            !(ev.occupancy[North] > 0 && ev.occupancy[South] > 0),
            "both directions inside: {}",
            ev.occupancy
        );
    }

    // después de que sale el peatón entra una dirección; la otra entra
    // solo cuando la primera ya salió
    let pos = |kind: BridgeEventKind, class: TravelerClass| {
        events
            .iter()
            .position(|e| e.kind == kind && e.class == class)
            .unwrap()
    };
    let ped_out = pos(BridgeEventKind::Exited, Pedestrian);
    let (first, second) = if pos(BridgeEventKind::Entered, North) < pos(BridgeEventKind::Entered, South) {
        (North, South)
    } else {
        (South, North)
    };
    assert!(ped_out < pos(BridgeEventKind::Entered, first));
    assert!(pos(BridgeEventKind::Exited, first) < pos(BridgeEventKind::Entered, second));

    for class in [North, South] {
        let suspensions = events
            .iter()
            .filter(|e| e.kind == BridgeEventKind::Waiting && e.class == class)
            .count();
        assert_eq!(suspensions, 1, "{class:?}");
    }

    assert_eq!(monitor.snapshot().completed, ClassCounts::new(1, 1, 1));
}

// ============================================================================
// Escenario 5
// ============================================================================

/// Sin turnos ni envejecimiento, un flujo al norte que nunca deja el tunel
/// vacío hace esperar al sur mientras dure. Esto documenta el comportamiento,
/// no lo corrige.
#[test]
fn continuous_north_stream_starves_south() {
    let monitor = Arc::new(BridgeMonitor::new());
    let stop = Arc::new(AtomicBool::new(false));
    let relayed = Arc::new(AtomicU64::new(0));

    let stream = {
        let monitor = Arc::clone(&monitor);
        let stop = Arc::clone(&stop);
        let relayed = Arc::clone(&relayed);
        thread::spawn(move || {
            monitor.request_entry(North);
            while !stop.load(Ordering::SeqCst) {
                // el siguiente entra antes de que salga el anterior
                monitor.request_entry(North);
                monitor.release_exit(North);
                relayed.fetch_add(1, Ordering::SeqCst);
                thread::yield_now();
            }
            monitor.release_exit(North);
        })
    };
    assert!(wait_until(LONG, || monitor.occupancy(North) >= 1));

    let entered = Arc::new(AtomicBool::new(false));
    let south = {
        let monitor = Arc::clone(&monitor);
        let entered = Arc::clone(&entered);
        thread::spawn(move || {
            monitor.request_entry(South);
            entered.store(true, Ordering::SeqCst);
            monitor.release_exit(South);
        })
    };
    assert!(wait_until(LONG, || monitor.waiting(South) == 1));

    let before = relayed.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(200));
    assert!(relayed.load(Ordering::SeqCst) > before, "north stream stalled");
    assert!(!entered.load(Ordering::SeqCst), "south entered during the north stream");

    stop.store(true, Ordering::SeqCst);
    stream.join().unwrap();
    south.join().unwrap();
    assert!(entered.load(Ordering::SeqCst));
    assert_eq!(monitor.completed(South), 1);
}

// ============================================================================
// Invariantes bajo carga
// ============================================================================

#[test]
fn random_load_keeps_classes_exclusive() {
    let (monitor, events) = recording_monitor();
    let per_class = 25;
    let mut workers = Vec::new();

    for (i, class) in TravelerClass::ALL.into_iter().enumerate() {
        for j in 0..per_class {
            let monitor = Arc::clone(&monitor);
            let mut rng = StdRng::seed_from_u64((i * 1000 + j) as u64);
            workers.push(thread::spawn(move || {
                thread::sleep(Duration::from_micros(rng.gen_range(0..3000)));
                monitor.request_entry(class);
                thread::sleep(Duration::from_micros(rng.gen_range(0..1500)));
                monitor.release_exit(class);
            }));
        }
    }
    // si alguna entrada no volviera nunca, esto no terminaría
    for w in workers {
        w.join().unwrap();
    }

    let events = events.lock().unwrap();
    let mut last_completed = ClassCounts::default();
    for ev in events.iter() {
        assert!(ev.occupancy.busy_classes().len() <= 1, "mixed classes: {}", ev.occupancy);
        match ev.kind {
            BridgeEventKind::Exited => {
                assert_eq!(ev.completed[ev.class], last_completed[ev.class] + 1);
            }
            BridgeEventKind::Entered | BridgeEventKind::Waiting => {
                assert_eq!(ev.completed, last_completed);
            }
        }
        last_completed = ev.completed;
    }

    let snap = monitor.snapshot();
    assert_eq!(snap.occupancy.total(), 0);
    assert_eq!(snap.waiting.total(), 0);
    assert_eq!(snap.completed, ClassCounts::new(per_class as u64, per_class as u64, per_class as u64));
}
