use glam::Vec2;

use crate::api::config::QuestConfig;
use crate::api::types::SoundEvent;
use crate::assets::manifest::{ContentMedia, ManifestError, QuestManifest};
use crate::audio::{AudioState, MediaKind, MusicAction};
use crate::bridge::protocol::{CommandBuffer, UiCommand, PROTOCOL_VERSION};
use crate::core::progress::ProgressStore;
use crate::core::screen::{progress_label, Screen, ScreenState};
use crate::core::sequencer::{Choice, Phase, Presentation, Resolution, StageError, StageSequencer};
use crate::core::storage::{Clock, KeyValueStore};
use crate::core::timers::{TimerId, TimerQueue};
use crate::input::queue::{InputEvent, InputQueue};
use crate::layout::{
    self, ball_rest_position, kickoff_spot, resolve_viewport, MapCamera, MapPoint, PointBuffer,
    RedrawGuard, RedrawToken,
};

/// Pause on the map before the kickoff button appears.
const KICKOFF_READY_MS: u32 = 1000;
/// Ball toss: wind-up, rise to the apex, fall onto the first marker.
const TOSS_WINDUP_MS: u32 = 50;
const TOSS_RISE_MS: u32 = 800;
const TOSS_FALL_MS: u32 = 700;
/// Apex of the toss as a fraction of the viewport height.
const TOSS_APEX: f32 = 0.2;
/// Pass from one marker to the next.
const BALL_PASS_MS: u32 = 1200;
/// Restore: wait for the map, centre the camera, then open the task.
const RESTORE_CENTRE_MS: u32 = 800;
const RESTORE_TASK_MS: u32 = 300;
/// Delay before the character starts running, and the rest after arrival.
const RUN_START_MS: u32 = 200;
const ARRIVAL_REST_MS: u32 = 300;
/// Retry of the next music track after a playback failure.
const MUSIC_RETRY_MS: u32 = 500;
/// Hint bubble offset from its marker.
const HINT_OFFSET: Vec2 = Vec2::new(40.0, -20.0);

/// Delayed steps of the quest choreography.
#[derive(Debug)]
enum Cue {
    RedrawMap(RedrawToken),
    KickoffReady,
    HideStartHint,
    BallApex,
    BallLanded,
    OpenFirstTask,
    RestoreCentre,
    RestoreTask,
    PresentStage,
    Reveal(Resolution),
    RunCharacter,
    ArriveTask,
    ShowHint,
    ResizeSettled,
    RetryMusic,
}

/// The whole quest session: progress, stage flow, map, screens and audio.
///
/// Input arrives through [`Quest::handle_input`]; time moves only through
/// [`Quest::tick`]. Everything the page has to do comes out of
/// [`Quest::drain_commands`].
pub struct Quest<S: KeyValueStore, C: Clock> {
    config: QuestConfig,
    manifest: QuestManifest,
    progress: ProgressStore<S, C>,
    sequencer: StageSequencer,
    screens: ScreenState,
    timers: TimerQueue<Cue>,
    redraw: RedrawGuard,
    camera: MapCamera,
    points: Vec<MapPoint>,
    buffer: PointBuffer,
    audio: AudioState,
    commands: CommandBuffer,
    viewport: Vec2,
    hint_timer: Option<TimerId>,
    start_hint_timer: Option<TimerId>,
    resize_timer: Option<TimerId>,
    kickoff_armed: bool,
    /// Ball or character animation in progress; the map ignores taps and
    /// redraws leave the animated pieces alone.
    in_transit: bool,
}

impl<S: KeyValueStore, C: Clock> Quest<S, C> {
    pub fn new(manifest: QuestManifest, storage: S, clock: C, viewport: Vec2) -> Self {
        let config = manifest.settings.clone();
        let total = manifest.total_stages();
        let viewport = resolve_viewport(viewport, Vec2::from(config.fallback_viewport));
        let progress = ProgressStore::new(storage, clock, config.progress_key.clone(), total);
        let audio = AudioState::new(
            config.music_tracks.clone(),
            config.music_volume,
            config.sound_effects_volume,
        );

        Self {
            manifest,
            progress,
            sequencer: StageSequencer::new(total),
            screens: ScreenState::new(),
            timers: TimerQueue::new(),
            redraw: RedrawGuard::new(),
            camera: MapCamera::new(viewport),
            points: Vec::new(),
            buffer: PointBuffer::new(),
            audio,
            commands: CommandBuffer::new(),
            viewport,
            hint_timer: None,
            start_hint_timer: None,
            resize_timer: None,
            kickoff_armed: false,
            in_transit: false,
            config,
        }
    }

    /// Parse a manifest and build a session over it.
    pub fn from_json(json: &str, storage: S, clock: C, viewport: Vec2) -> Result<Self, ManifestError> {
        let manifest = QuestManifest::from_json(json)?;
        Ok(Self::new(manifest, storage, clock, viewport))
    }

    /// Load progress and show either the start screen or the restore prompt.
    pub fn init(&mut self) {
        let stage = self.progress.load();
        let total = self.total_stages();
        self.sequencer.restore(stage);
        self.relayout();
        self.emit(UiCommand::SetMusicIcon { playing: false });

        if stage > 0 && stage < total {
            log::info!("quest: saved progress at stage {}", stage);
            self.show_restore_prompt();
        } else {
            self.sequencer.restart();
            self.show_screen(Screen::Start);
        }
    }

    // ---- Accessors ----

    pub fn config(&self) -> &QuestConfig {
        &self.config
    }

    pub fn current_stage(&self) -> usize {
        self.sequencer.current()
    }

    pub fn total_stages(&self) -> usize {
        self.sequencer.total()
    }

    pub fn screen(&self) -> Screen {
        self.screens.active()
    }

    pub fn screens(&self) -> &ScreenState {
        &self.screens
    }

    pub fn sequencer(&self) -> &StageSequencer {
        &self.sequencer
    }

    pub fn progress(&self) -> &ProgressStore<S, C> {
        &self.progress
    }

    pub fn audio(&self) -> &AudioState {
        &self.audio
    }

    pub fn points(&self) -> &[MapPoint] {
        &self.points
    }

    pub fn point_buffer(&self) -> &PointBuffer {
        &self.buffer
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn is_in_transit(&self) -> bool {
        self.in_transit
    }

    pub fn drain_commands(&mut self) -> Vec<UiCommand> {
        self.commands.drain()
    }

    pub fn commands_mut(&mut self) -> &mut CommandBuffer {
        &mut self.commands
    }

    // ---- Frame loop ----

    /// Apply queued input, then advance time.
    pub fn update(&mut self, dt_ms: f64, input: &InputQueue) {
        for event in input.iter() {
            self.handle_input(*event);
        }
        self.tick(dt_ms);
    }

    /// Advance the choreography clock and run whatever came due.
    pub fn tick(&mut self, dt_ms: f64) {
        for cue in self.timers.tick(dt_ms) {
            self.on_cue(cue);
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Start if self.screens.is_active(Screen::Start) => self.start_game(),
            InputEvent::Kickoff => self.kickoff(),
            InputEvent::DismissStartHint => self.hide_start_hint(),
            InputEvent::RestoreAccepted if self.screens.is_active(Screen::Restore) => self.restore_game(),
            InputEvent::RestoreDeclined if self.screens.is_active(Screen::Restore) => self.reset_progress(),
            InputEvent::Restart if self.screens.is_active(Screen::Final) => self.reset_progress(),
            InputEvent::SelectOption { index } => self.choose(Choice::Option(index)),
            InputEvent::ActionPressed => self.choose(Choice::Press),
            InputEvent::PenaltyShot { x, y, area_width, area_height } => {
                self.choose(Choice::Shot { x, y, area_width, area_height })
            }
            InputEvent::Continue => self.continue_after_feedback(),
            InputEvent::ModalNext => {
                if self.close_modal() {
                    self.after_content();
                }
            }
            InputEvent::ModalClose => {
                self.close_modal();
            }
            InputEvent::PointTapped { index } => self.go_to_stage(index),
            InputEvent::ToggleMusic => self.toggle_music(),
            InputEvent::MusicEnded => {
                if let Some(action) = self.audio.track_ended() {
                    self.apply_music(action);
                }
            }
            InputEvent::MusicFailed => self.media_failed(MediaKind::Music),
            InputEvent::MediaLoaded => self.set_loader(false),
            InputEvent::MediaFailed { kind } => self.media_failed(kind),
            InputEvent::Resize { width, height } => self.resize(Vec2::new(width, height)),
            other => log::debug!("quest: ignoring {:?} on {:?}", other, self.screen()),
        }
    }

    fn on_cue(&mut self, cue: Cue) {
        match cue {
            Cue::RedrawMap(token) => self.draw_map(token),
            Cue::KickoffReady => self.kickoff_ready(),
            Cue::HideStartHint => {
                self.start_hint_timer = None;
                self.emit(UiCommand::HideStartHint);
            }
            Cue::BallApex => {
                let first = self.first_point_pos();
                let apex_y = self.viewport.y * TOSS_APEX;
                self.emit(UiCommand::MoveBall { x: first.x, y: apex_y, duration_ms: TOSS_RISE_MS });
                self.timers.schedule(TOSS_RISE_MS, Cue::BallLanded);
            }
            Cue::BallLanded => {
                let first = self.first_point_pos();
                self.emit(UiCommand::MoveBall { x: first.x, y: first.y, duration_ms: TOSS_FALL_MS });
                self.timers.schedule(TOSS_FALL_MS, Cue::OpenFirstTask);
            }
            Cue::OpenFirstTask => {
                self.emit(UiCommand::SetBallFlying { flying: false });
                self.in_transit = false;
                self.open_task();
            }
            Cue::RestoreCentre => {
                if let Some(point) = self.current_point() {
                    self.move_camera(point.pos(), true);
                }
                self.timers.schedule(RESTORE_TASK_MS, Cue::RestoreTask);
            }
            Cue::RestoreTask => self.open_task(),
            Cue::PresentStage => self.present_stage(),
            Cue::Reveal(resolution) => self.reveal(resolution),
            Cue::RunCharacter => {
                if let Some(target) = self.current_point() {
                    self.emit(UiCommand::MoveCharacter {
                        x: target.x,
                        y: target.y,
                        z: target.z,
                        facing_deg: target.facing_deg(),
                        duration_ms: self.config.character_speed_ms,
                    });
                    self.move_camera(target.pos(), false);
                }
                self.timers
                    .schedule(self.config.character_speed_ms + ARRIVAL_REST_MS, Cue::ArriveTask);
            }
            Cue::ArriveTask => {
                self.in_transit = false;
                self.open_task();
            }
            Cue::ShowHint => {
                self.hint_timer = None;
                self.show_hint();
            }
            Cue::ResizeSettled => {
                self.resize_timer = None;
                self.relayout();
                if self.screens.is_active(Screen::Map) {
                    self.emit(UiCommand::MoveCamera { x: 0.0, y: 0.0, instant: true });
                    self.request_redraw();
                }
            }
            Cue::RetryMusic => {
                if let Some(action) = self.audio.retry() {
                    self.apply_music(action);
                }
            }
        }
    }

    // ---- Flows ----

    fn start_game(&mut self) {
        self.cancel_choreography();
        self.sequencer.restart();
        self.show_screen(Screen::Map);
        self.request_redraw();
        self.timers.schedule(KICKOFF_READY_MS, Cue::KickoffReady);
    }

    fn reset_progress(&mut self) {
        log::info!("quest: starting over");
        self.progress.clear();
        self.start_game();
    }

    fn kickoff_ready(&mut self) {
        if !self.screens.is_active(Screen::Map) || self.current_stage() != 0 {
            return;
        }
        self.emit(UiCommand::ShowStartHint);
        self.start_hint_timer = Some(self.timers.schedule(self.config.start_hint_ms, Cue::HideStartHint));
        self.emit(UiCommand::ShowKickoff);
        self.kickoff_armed = true;
        self.move_camera(self.viewport * 0.5, true);
    }

    fn hide_start_hint(&mut self) {
        if let Some(id) = self.start_hint_timer.take() {
            self.timers.cancel(id);
        }
        self.emit(UiCommand::HideStartHint);
    }

    fn kickoff(&mut self) {
        if !std::mem::replace(&mut self.kickoff_armed, false) {
            return;
        }
        self.emit(UiCommand::HideKickoff);
        self.hide_start_hint();

        let first = self.first_point_pos();
        self.move_camera(first, true);
        let spot = kickoff_spot(self.viewport);
        self.emit(UiCommand::PlaceBall { x: spot.x, y: spot.y });
        self.emit(UiCommand::SetBallFlying { flying: true });
        self.in_transit = true;
        self.timers.schedule(TOSS_WINDUP_MS, Cue::BallApex);
    }

    fn show_restore_prompt(&mut self) {
        self.emit(UiCommand::ShowRestorePrompt { stage_number: self.current_stage() + 1 });
        self.show_screen(Screen::Restore);
    }

    fn restore_game(&mut self) {
        self.show_screen(Screen::Map);
        self.request_redraw();
        self.timers.schedule(RESTORE_CENTRE_MS, Cue::RestoreCentre);
    }

    /// Switch to the task screen and present the current stage shortly after.
    fn open_task(&mut self) {
        self.show_screen(Screen::Task);
        self.emit_progress_label();
        self.timers.schedule(self.config.stage_present_delay_ms, Cue::PresentStage);
    }

    fn present_stage(&mut self) {
        match self.sequencer.present(&self.manifest) {
            Presentation::Stage(stage) => self.emit(UiCommand::PresentStage { stage }),
            Presentation::Finished => self.show_final(),
            Presentation::Recovery(err) => self.recover(err),
        }
    }

    /// Broken stage: step back one stage, persist, and offer to resume.
    fn recover(&mut self, err: StageError) {
        log::error!("quest: {}; stepping back", err);
        let stage = self.sequencer.step_back();
        self.progress.save(stage);
        if stage > 0 && stage < self.total_stages() {
            self.show_restore_prompt();
        } else {
            self.sequencer.restart();
            self.show_screen(Screen::Start);
        }
    }

    fn choose(&mut self, choice: Choice) {
        if !self.screens.is_active(Screen::Task) || self.screens.modal_open() {
            return;
        }
        let Some(resolution) = self.sequencer.resolve(&self.manifest, choice) else {
            log::debug!("quest: choice {:?} ignored", choice);
            return;
        };

        if let Choice::Shot { x, y, .. } = choice {
            self.emit(UiCommand::ShowShot { x, y });
        }
        if resolution.selected.is_some() {
            self.emit(UiCommand::MarkAnswer {
                selected: resolution.selected,
                correct_option: resolution.correct_option,
                correct: resolution.correct,
            });
        }

        if resolution.delay_ms == 0 {
            self.reveal(resolution);
        } else {
            self.timers.schedule(resolution.delay_ms, Cue::Reveal(resolution));
        }
    }

    fn reveal(&mut self, resolution: Resolution) {
        for &sound in &resolution.sounds {
            self.play_sound(sound);
        }
        self.emit(UiCommand::ShowFeedback {
            text: resolution.feedback,
            tone: resolution.tone,
        });
        self.emit(UiCommand::ShowContinue);
    }

    fn continue_after_feedback(&mut self) {
        if !self.screens.is_active(Screen::Task) || self.screens.modal_open() {
            return;
        }
        if self.sequencer.phase() != Phase::AwaitingAdvance {
            log::debug!("quest: continue before the stage resolved");
            return;
        }
        self.show_content();
    }

    /// Reveal modal for the current stage, or straight on when it has none.
    fn show_content(&mut self) {
        let stage = self.current_stage();
        let Some(content) = self.manifest.content(stage) else {
            log::warn!("quest: no content for stage {}", stage);
            self.after_content();
            return;
        };

        let media = content.media();
        let title = content.title_or_default();
        let caption = content.caption();
        if matches!(media, ContentMedia::Image { .. } | ContentMedia::Video { .. }) {
            self.set_loader(true);
        }
        self.emit(UiCommand::ShowContent { title, caption, media });
        self.screens.open_modal();
    }

    fn close_modal(&mut self) -> bool {
        let was_open = self.screens.close_modal();
        if was_open {
            self.emit(UiCommand::CloseModal);
        }
        self.set_loader(false);
        was_open
    }

    /// After the reveal: the final screen on the last stage, else the map.
    fn after_content(&mut self) {
        if self.sequencer.finish() {
            self.show_final();
            return;
        }
        self.show_screen(Screen::Map);
        self.request_redraw();
        self.start_hint_timer();
    }

    fn go_to_stage(&mut self, target: usize) {
        if !self.screens.is_active(Screen::Map) || self.in_transit {
            return;
        }
        let previous = self.current_point();
        match self.sequencer.advance_to(target) {
            Err(reason) => {
                log::debug!("quest: tap on {} rejected: {}", target, reason);
                if let Some(point) = self.points.get(target).copied() {
                    self.emit(UiCommand::RejectTap {
                        index: target,
                        side: point.side_in(self.viewport.x),
                    });
                }
            }
            Ok(stage) => {
                self.stop_hint();
                self.progress.save(stage);
                self.relayout();

                if let Some(next) = self.points.get(stage).copied() {
                    self.emit(UiCommand::MoveBall { x: next.x, y: next.y, duration_ms: BALL_PASS_MS });
                }
                if let Some(prev) = previous {
                    self.position_character(&prev);
                }
                self.in_transit = true;
                self.request_redraw();
                self.timers.schedule(RUN_START_MS, Cue::RunCharacter);
            }
        }
    }

    fn show_final(&mut self) {
        let total = self.total_stages();
        self.stop_hint();
        self.progress.save_completed(self.current_stage().min(total.saturating_sub(1)));
        self.show_screen(Screen::Final);
        self.emit(UiCommand::Confetti);
        let summary = self.manifest.final_summary();
        self.emit(UiCommand::ShowFinal { summary });
        self.play_sound(SoundEvent::Applause);
        log::info!("quest: finished all {} stages", total);
    }

    // ---- Hints ----

    fn start_hint_timer(&mut self) {
        self.stop_hint_timer();
        if self.current_stage() + 1 < self.total_stages() {
            self.hint_timer = Some(self.timers.schedule(self.config.hint_delay_ms, Cue::ShowHint));
        }
    }

    fn stop_hint_timer(&mut self) {
        if let Some(id) = self.hint_timer.take() {
            self.timers.cancel(id);
        }
    }

    fn stop_hint(&mut self) {
        self.stop_hint_timer();
        self.emit(UiCommand::HideHint);
    }

    fn show_hint(&mut self) {
        if !self.screens.is_active(Screen::Map) {
            return;
        }
        let index = self.current_stage() + 1;
        if let Some(next) = self.points.get(index) {
            let at = next.pos() + HINT_OFFSET;
            self.emit(UiCommand::ShowHint { index, x: at.x, y: at.y });
        }
    }

    // ---- Map ----

    /// Recompute marker positions for the current viewport and stage.
    fn relayout(&mut self) {
        self.points = layout::layout(
            self.viewport,
            self.total_stages(),
            self.config.layout_mode,
            self.config.layout_padding,
        );
        let current = self.current_stage();
        self.buffer.rebuild(&self.points, self.viewport.x, current);
    }

    /// Schedule a map redraw unless one is already in flight.
    fn request_redraw(&mut self) {
        match self.redraw.begin() {
            Some(token) => {
                self.timers.schedule(self.config.redraw_delay_ms, Cue::RedrawMap(token));
            }
            None => log::debug!("quest: map redraw already in flight, dropped"),
        }
    }

    fn draw_map(&mut self, token: RedrawToken) {
        self.relayout();
        let current = self.current_stage();

        if self.points.is_empty() {
            log::error!("quest: no map points for {} stages", self.total_stages());
        } else {
            self.emit(UiCommand::DrawMap {
                point_count: self.points.len(),
                current_stage: current,
                mobile: self.config.is_mobile(self.viewport.x),
                version: PROTOCOL_VERSION,
            });
            self.emit_progress_label();

            // Animations own the character, ball and camera while running
            if !self.in_transit {
                if let Some(point) = self.current_point() {
                    self.position_character(&point);
                    if current > 0 {
                        self.move_camera(point.pos(), true);
                    }
                }
                let ball = ball_rest_position(self.viewport, &self.points, current);
                self.emit(UiCommand::PlaceBall { x: ball.x, y: ball.y });
            }
        }
        self.redraw.finish(token);
    }

    fn resize(&mut self, viewport: Vec2) {
        self.viewport = resolve_viewport(viewport, Vec2::from(self.config.fallback_viewport));
        self.camera.resize(self.viewport);
        if let Some(id) = self.resize_timer.take() {
            self.timers.cancel(id);
        }
        self.resize_timer = Some(self.timers.schedule(self.config.resize_debounce_ms, Cue::ResizeSettled));
    }

    fn position_character(&mut self, point: &MapPoint) {
        self.emit(UiCommand::PositionCharacter {
            x: point.x,
            y: point.y,
            z: point.z,
            facing_deg: point.facing_deg(),
        });
    }

    fn move_camera(&mut self, target: Vec2, instant: bool) {
        let mv = self.camera.center_on(target, instant);
        self.emit(UiCommand::MoveCamera { x: mv.x, y: mv.y, instant: mv.instant });
    }

    fn current_point(&self) -> Option<MapPoint> {
        self.points
            .get(self.current_stage())
            .or_else(|| self.points.first())
            .copied()
    }

    fn first_point_pos(&self) -> Vec2 {
        self.points
            .first()
            .map(MapPoint::pos)
            .unwrap_or_else(|| self.viewport * 0.5)
    }

    // ---- Audio and media ----

    fn toggle_music(&mut self) {
        match self.audio.toggle() {
            Ok(action) => self.apply_music(action),
            Err(e) => log::warn!("quest: music toggle ignored: {}", e),
        }
    }

    fn apply_music(&mut self, action: MusicAction) {
        match action {
            MusicAction::Play { track, volume } => {
                log::info!("quest: playing {}", track);
                self.emit(UiCommand::PlayMusic { track, volume });
                self.emit(UiCommand::SetMusicIcon { playing: true });
            }
            MusicAction::Pause => {
                self.emit(UiCommand::PauseMusic);
                self.emit(UiCommand::SetMusicIcon { playing: false });
            }
        }
    }

    fn play_sound(&mut self, sound: SoundEvent) {
        if let Some(sound) = self.audio.sound(sound) {
            let volume = self.audio.effects_volume();
            self.emit(UiCommand::PlaySound { sound, volume });
        }
    }

    /// Media never breaks the quest: hide the loader, degrade, continue.
    fn media_failed(&mut self, kind: MediaKind) {
        log::warn!("quest: {:?} failed to load", kind);
        self.set_loader(false);
        match kind {
            MediaKind::Music => {
                let retry = self.audio.music_failed();
                self.emit(UiCommand::DisableMusicControl);
                self.emit(UiCommand::SetMusicIcon { playing: false });
                if retry {
                    self.timers.schedule(MUSIC_RETRY_MS, Cue::RetryMusic);
                }
            }
            MediaKind::Image => self.emit(UiCommand::MediaPlaceholder {
                text: "Photo temporarily unavailable".to_string(),
            }),
            MediaKind::Video => self.emit(UiCommand::MediaPlaceholder {
                text: "Video temporarily unavailable".to_string(),
            }),
            MediaKind::Sound => {}
        }
    }

    fn set_loader(&mut self, visible: bool) {
        if self.screens.loader_visible() == visible {
            return;
        }
        self.screens.set_loader(visible);
        self.emit(if visible { UiCommand::ShowLoader } else { UiCommand::HideLoader });
    }

    // ---- Helpers ----

    fn show_screen(&mut self, screen: Screen) {
        self.screens.show(screen);
        self.emit(UiCommand::ShowScreen { screen });
    }

    fn emit_progress_label(&mut self) {
        let text = progress_label(self.current_stage(), self.total_stages());
        self.emit(UiCommand::SetProgressLabel { text });
    }

    fn emit(&mut self, command: UiCommand) {
        self.commands.push(command);
    }

    /// Drop pending choreography from a previous run.
    fn cancel_choreography(&mut self) {
        self.timers.cancel_where(|cue| !matches!(cue, Cue::RedrawMap(_) | Cue::RetryMusic));
        self.hint_timer = None;
        self.start_hint_timer = None;
        self.resize_timer = None;
        self.kickoff_armed = false;
        self.in_transit = false;
    }
}
