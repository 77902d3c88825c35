use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::tunnel::entities::{ClassCounts, TravelerClass};

/// Estado compartido del tunel. Solo se toca con el candado del monitor tomado.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BridgeState {
    /// Viajeros de cada clase dentro del tunel ahora mismo.
    occupancy: ClassCounts,
    /// Cruces terminados por clase. Solo crece.
    completed: ClassCounts,
    /// Viajeros suspendidos dentro de `request_entry`. Ningún predicado lo mira.
    waiting: ClassCounts,
}

impl BridgeState {
    /// Predicado de entrada: las otras dos clases tienen que estar en cero.
    /// La ocupación de la propia clase no cuenta (si contara, se bloquearía sola).
    fn can_enter(&self, class: TravelerClass) -> bool {
        class.others().iter().all(|other| self.occupancy[*other] == 0)
    }

    fn exclusive(&self) -> bool {
        self.occupancy.busy_classes().len() <= 1
    }
}

/// Copia del estado tomada bajo el candado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSnapshot {
    pub occupancy: ClassCounts,
    pub completed: ClassCounts,
    pub waiting: ClassCounts,
}

/// Qué transición acaba de ocurrir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeEventKind {
    /// El predicado falló y el viajero se va a dormir.
    Waiting,
    Entered,
    Exited,
}

/// Evento que recibe el observador, con los contadores ya actualizados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeEvent {
    pub kind: BridgeEventKind,
    pub class: TravelerClass,
    pub occupancy: ClassCounts,
    pub completed: ClassCounts,
}

/// Callback que se ejecuta dentro de la sección crítica.
/// No debe volver a llamar al monitor (el candado no es reentrante). Formatear
/// el monitor con `{:?}` o `{}` desde aquí no bloquea: muestra `<locked>`.
pub type BridgeObserver = Arc<dyn Fn(&BridgeEvent) + Send + Sync>;

/// Monitor del tunel: un solo candado para los tres contadores y una sola
/// variable de condición para todos los que esperan.
///
/// Cualquier cantidad de viajeros de la misma clase puede estar dentro a la
/// vez; dos clases distintas nunca. No hay política de justicia: una clase con
/// demanda continua puede dejar esperando a las otras indefinidamente.
///
/// ```rust
/// use tunnelcity::tunnel::{BridgeMonitor, TravelerClass};
///
/// let monitor = BridgeMonitor::new();
/// monitor.request_entry(TravelerClass::North);
/// assert_eq!(monitor.occupancy(TravelerClass::North), 1);
/// monitor.release_exit(TravelerClass::North);
/// assert_eq!(monitor.completed(TravelerClass::North), 1);
/// ```
pub struct BridgeMonitor {
    state: Mutex<BridgeState>,
    changed: Condvar,
    observer: Option<BridgeObserver>,
}

impl BridgeMonitor {
    /// Crea el monitor con todos los contadores en cero.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BridgeState::default()),
            changed: Condvar::new(),
            observer: None,
        }
    }

    /// Igual que `new`, pero cada transición se reporta a `observer`
    /// en el mismo orden en que se serializó.
    pub fn with_observer(observer: BridgeObserver) -> Self {
        Self {
            observer: Some(observer),
            ..Self::new()
        }
    }

    /// Bloquea hasta que `class` pueda entrar y la registra dentro del tunel.
    ///
    /// Puede bloquear para siempre si otra clase nunca deja el tunel vacío.
    pub fn request_entry(&self, class: TravelerClass) {
        let mut state = self.state.lock();

        if !state.can_enter(class) {
            state.waiting[class] += 1;
            self.notify(&state, BridgeEventKind::Waiting, class);
            tracing::trace!(%class, occupancy = %state.occupancy, "waiting for the tunnel");

            // wait() suelta el candado mientras duerme y lo recupera antes de volver
            while !state.can_enter(class) {
                self.changed.wait(&mut state);
            }
            state.waiting[class] -= 1;
        }

        // mismo tramo crítico que el predicado: nadie se cuela entre medio
        state.occupancy[class] += 1;
        debug_assert!(state.exclusive(), "two classes inside: {}", state.occupancy);
        self.notify(&state, BridgeEventKind::Entered, class);
        tracing::trace!(%class, occupancy = %state.occupancy, "entered");
    }

    /// Saca a un viajero de `class` del tunel. Si era el último de su clase
    /// despierta a **todos** los que esperan: una salida puede habilitar a
    /// las dos clases restantes.
    ///
    /// # Panics
    ///
    /// Si no había nadie de `class` dentro. Cada `release_exit` tiene que
    /// corresponder a un `request_entry` previo de la misma clase.
    pub fn release_exit(&self, class: TravelerClass) {
        let mut state = self.state.lock();

        assert!(
            state.occupancy[class] > 0,
            "release_exit({class:?}) without a matching request_entry"
        );
        state.occupancy[class] -= 1;
        state.completed[class] += 1;
        debug_assert!(state.exclusive(), "two classes inside: {}", state.occupancy);
        self.notify(&state, BridgeEventKind::Exited, class);
        tracing::trace!(%class, occupancy = %state.occupancy, "exited");

        if state.occupancy[class] == 0 {
            self.changed.notify_all();
        }
    }

    /// Copia de los tres contadores.
    pub fn snapshot(&self) -> BridgeSnapshot {
        let state = self.state.lock();
        BridgeSnapshot {
            occupancy: state.occupancy,
            completed: state.completed,
            waiting: state.waiting,
        }
    }

    pub fn occupancy(&self, class: TravelerClass) -> u64 {
        self.state.lock().occupancy[class]
    }

    pub fn completed(&self, class: TravelerClass) -> u64 {
        self.state.lock().completed[class]
    }

    pub fn waiting(&self, class: TravelerClass) -> u64 {
        self.state.lock().waiting[class]
    }

    fn notify(&self, state: &BridgeState, kind: BridgeEventKind, class: TravelerClass) {
        if let Some(observer) = &self.observer {
            observer(&BridgeEvent {
                kind,
                class,
                occupancy: state.occupancy,
                completed: state.completed,
            });
        }
    }
}

impl Default for BridgeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BridgeMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("BridgeMonitor");
        // try_lock: se puede formatear desde el observador, con el candado tomado
        match self.state.try_lock() {
            Some(state) => out
                .field("occupancy", &state.occupancy)
                .field("completed", &state.completed)
                .field("waiting", &state.waiting),
            None => out.field("state", &format_args!("<locked>")),
        };
        out.field("observer", &self.observer.is_some()).finish()
    }
}

impl fmt::Display for BridgeMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(state) = self.state.try_lock() else {
            return f.write_str("Monitor: <locked>");
        };
        let completed = state.completed;
        write!(
            f,
            "Monitor: North: {} South: {} Pedestrians: {}",
            completed[TravelerClass::North],
            completed[TravelerClass::South],
            completed[TravelerClass::Pedestrian]
        )
    }
}
