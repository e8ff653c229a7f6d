//! Headless walkthrough: a swing door opening for traffic, and a remote
//! vault door pinned open, secured, then locked down by a button push.
//!
//! ```sh
//! cargo run --example sim_demo
//! ```

use bevy::log::LogPlugin;
use bevy::prelude::*;
use spangate::prelude::*;

fn main() {
    let mut app = App::new();
    app.add_plugins((LogPlugin::default(), SpanGatePlugin));
    app.add_systems(Startup, setup);
    app.add_systems(Update, drive_scenario.in_set(DoorSimSet::Occupancy));

    // A few seconds of simulation at 60 ticks per second.
    for _ in 0..240 {
        app.update();
    }

    let world = app.world_mut();
    let mut doors = world.query::<(&SimId, &DoorState, &DoorProxies, Option<&RemoteLock>)>();
    for (id, state, proxies, lock) in doors.iter(world) {
        println!(
            "{}: open={} hold_open={} forbidden={} proxies={} lock={:?}",
            id,
            state.open,
            state.hold_open,
            state.forbidden,
            proxies.0.len(),
            lock.map(|l| l.state)
        );
    }
}

fn setup(
    mut commands: Commands,
    mut edifice: ResMut<EdificeGrid>,
    mut buildings: ResMut<BuildingGrid>,
    mut reach: ResMut<ReachabilityCache>,
    occupancy: Res<OccupancyGrid>,
    mut ids: ResMut<SimIdFactory>,
) {
    // An unowned 3-wide swing door; the mover next to it pushes it open on
    // its first step and it closes behind them.
    spawn_logical_door(
        &mut commands,
        &mut edifice,
        &mut buildings,
        &mut reach,
        &occupancy,
        &mut ids,
        DoorSpawnConfig::new(
            DoorKind::DoubleSwing,
            CellRect::new(GridPos::new(10, 5), 3, 1),
        ),
    );

    let mover_id = ids.next("mover");
    commands.spawn((
        mover_id,
        Occupant::default(),
        CellPosition {
            cell: GridPos::new(11, 4),
            prev: GridPos::new(11, 3),
        },
    ));

    // A remote vault door wired to a control button.
    let vault = spawn_logical_door(
        &mut commands,
        &mut edifice,
        &mut buildings,
        &mut reach,
        &occupancy,
        &mut ids,
        DoorSpawnConfig::new(DoorKind::Remote, CellRect::new(GridPos::new(20, 5), 1, 2))
            .with_faction(1),
    );
    let button = spawn_remote_button(&mut commands, &mut ids);
    commands.queue(move |world: &mut World| {
        if let Some(mut lock) = world.get_mut::<RemoteLock>(vault) {
            lock.button = Some(button);
        }
        if let Some(mut button) = world.get_mut::<RemoteButton>(button) {
            button.linked.insert(vault);
        }
    });
}

/// Scripted inputs: pin the vault open, secure it mid-run (the lockdown
/// stays pending while the door is open), then push to complete it.
fn drive_scenario(
    frame: Res<FrameCount>,
    vaults: Query<Entity, With<RemoteLock>>,
    buttons: Query<Entity, With<RemoteButton>>,
    mut pushes: EventWriter<ButtonPushEvent>,
    mut door_commands: EventWriter<DoorCommand>,
) {
    match frame.frame {
        10 => {
            for button in &buttons {
                pushes.write(ButtonPushEvent { button });
            }
        }
        60 => {
            for vault in &vaults {
                door_commands.write(DoorCommand {
                    door: vault,
                    action: DoorCommandAction::SetSecured(true),
                });
            }
        }
        120 => {
            for button in &buttons {
                pushes.write(ButtonPushEvent { button });
            }
        }
        _ => {}
    }
}
