use bevy::prelude::*;

use super::{
    BlendedWeather, PrecipitationType, PushReason, RegionWeatherSimulation, TickReport,
    WeatherContext,
};
use crate::wind::angle_diff;

impl RegionWeatherSimulation {
    /// One authoritative tick of `dt` seconds.
    ///
    /// Order: snow catch-up, throttled climate sample, wind and event
    /// re-selection, pattern retrigger and blend, blended snapshot.
    pub fn tick(&mut self, dt: f32, ctx: &WeatherContext) -> TickReport {
        let mut report = TickReport::default();
        let now = ctx.now();

        if now > self.last_update_hours {
            self.advance_snow(now, ctx, &mut report);
            self.last_update_hours = now;
        }

        self.resample_climate(dt, ctx);

        if self.wind.is_expired(now) {
            self.wind.reselect(ctx.catalog, &self.climate, now, &mut self.rng);
            let def = ctx.catalog.pattern(self.blender.new.index);
            self.blender.new.drift(def, &mut self.rng);
            debug!("Region {} wind -> {}", self.coord, self.wind.code(ctx.catalog));
            report.request_push(PushReason::WindChanged);
        }

        let climate = self.climate;
        if self.event.is_expired(now)
            || self
                .event
                .should_stop(ctx.catalog, climate.rainfall, climate.temperature)
        {
            if self.event.reselect(ctx.catalog, &climate, now, &mut self.rng) {
                debug!("Region {} event -> {}", self.coord, self.event.code(ctx.catalog));
                report.request_push(PushReason::EventChanged);
            }
        }

        if self.blender.needs_retrigger(now) {
            self.trigger_transition(None, ctx);
            report.request_push(PushReason::Transition);
        }
        self.blender.tick(dt, ctx.time_speed_factor());

        self.refresh_blended(ctx);
        report
    }

    /// One replica tick: advance the blend already in flight and smooth the
    /// display values toward the last pushed state. No selection happens here.
    pub fn tick_replica(&mut self, dt: f32, ctx: &WeatherContext) {
        self.resample_climate(dt, ctx);
        self.blender.tick(dt, ctx.time_speed_factor());

        let sea_level = ctx.params.world.sea_level;
        let target_speed = self.wind.speed_at(sea_level, sea_level, &ctx.params.wind);
        let target_direction = self.wind.state.direction;
        let target_lightning = self.event.lightning_rate(ctx.catalog, self.effective_temperature());

        let s = &mut self.smoothing;
        if s.primed {
            let alpha = 1.0 - (-ctx.params.replica_smoothing_rate.max(0.0) * dt.max(0.0)).exp();
            s.wind_speed += (target_speed - s.wind_speed) * alpha;
            s.lightning_rate += (target_lightning - s.lightning_rate) * alpha;
            let turn = angle_diff(s.wind_direction, target_direction) * alpha;
            s.wind_direction = (s.wind_direction + turn).rem_euclid(std::f32::consts::TAU);
        } else {
            s.wind_speed = target_speed;
            s.wind_direction = target_direction;
            s.lightning_rate = target_lightning;
            s.primed = true;
        }

        let (speed, direction, lightning) = (s.wind_speed, s.wind_direction, s.lightning_rate);
        self.compose_blended(ctx, speed, direction, lightning);
    }

    fn advance_snow(&mut self, now: f64, ctx: &WeatherContext, report: &mut TickReport) {
        let pending = self.snow.pending_hours(now);
        if pending == 0 {
            return;
        }
        if pending > ctx.params.snow.inline_catchup_hours as u64 {
            report.snow_backlog = pending;
            return;
        }
        report.snow_hours = self.snow.advance_to(now, ctx.climate, &ctx.params.snow);
        if report.snow_hours > 0 {
            self.snow.fold_unchecked();
        }
    }

    /// Re-sample climate at most once per `climate_resample_interval_secs` of tick time.
    fn resample_climate(&mut self, dt: f32, ctx: &WeatherContext) {
        self.climate_timer += dt.max(0.0);
        if self.climate_timer < ctx.params.climate_resample_interval_secs {
            return;
        }
        self.climate_timer = 0.0;
        match Self::sample_climate(self.coord, ctx) {
            Some(sample) => self.climate = sample,
            None => debug!("Region {}: climate unavailable, keeping last sample", self.coord),
        }
    }

    fn effective_temperature(&self) -> f32 {
        self.climate.temperature + self.blender.blended(|p| p.temperature_offset)
    }

    /// Recompute [`RegionWeatherSimulation::current`] from authoritative values.
    pub(crate) fn refresh_blended(&mut self, ctx: &WeatherContext) {
        let sea_level = ctx.params.world.sea_level;
        let speed = self.wind.speed_at(sea_level, sea_level, &ctx.params.wind);
        let lightning = self.event.lightning_rate(ctx.catalog, self.effective_temperature());
        self.compose_blended(ctx, speed, self.wind.state.direction, lightning);
    }

    fn compose_blended(
        &mut self,
        ctx: &WeatherContext,
        wind_speed: f32,
        wind_direction: f32,
        lightning_rate: f32,
    ) {
        let temperature = self.effective_temperature();
        let precipitation = (self.blender.blended(|p| p.precipitation)
            + self.event.precipitation_boost(ctx.catalog))
        .clamp(0.0, 1.0);
        self.current = BlendedWeather {
            total_hours: ctx.now(),
            temperature,
            wind_speed,
            wind: Vec2::from_angle(wind_direction) * wind_speed,
            precipitation,
            precipitation_type: PrecipitationType::classify(precipitation, temperature),
            cloud_density: self.blender.blended(|p| p.cloud_density),
            fog_density: self.blender.blended(|p| p.fog_density),
            lightning_rate,
            blend_weight: self.blender.weight,
            pattern_code: self.blender.new.code(ctx.catalog).to_string(),
            wind_code: self.wind.code(ctx.catalog).to_string(),
            event_code: self.event.code(ctx.catalog).to_string(),
        };
    }
}
