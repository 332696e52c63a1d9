use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{job_member, member, rank};

/// A member as listed on a job. `member_rank_name` is the rank held when the
/// member was added; position and share are read from the live rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMember {
    pub member_id: Uuid,
    pub member_name: String,
    #[serde(rename = "member_rank")]
    pub member_rank_name: String,
    pub member_rank_position: Option<i32>,
    pub member_pay: Option<i64>,
}

/// One assignment as seen by the payout calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub assignment_id: i64,
    /// `None` when the assignment outlived its member row.
    pub member_id: Option<Uuid>,
    /// `None` when the member or its rank could not be resolved.
    pub share: Option<f64>,
}

struct Resolved {
    assignment: job_member::Model,
    member: Option<member::Model>,
    rank: Option<rank::Model>,
}

impl Resolved {
    fn member_name(&self) -> &str {
        self.member.as_ref().map_or("", |member| member.name.as_str())
    }

    fn into_payout_entry(self) -> RosterEntry {
        RosterEntry {
            assignment_id: self.assignment.id,
            member_id: self.member.map(|member| member.uuid),
            share: self.rank.map(|rank| rank.share),
        }
    }
}

fn roster_order(a: &Resolved, b: &Resolved) -> Ordering {
    let position = |r: &Resolved| r.rank.as_ref().map(|rank| rank.position);
    match (position(a), position(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.member_name().cmp(b.member_name()))
}

fn assemble(
    assignments: Vec<job_member::Model>,
    members: &HashMap<i64, member::Model>,
    ranks: &HashMap<i64, rank::Model>,
) -> HashMap<i64, Vec<Resolved>> {
    let mut rosters: HashMap<i64, Vec<Resolved>> = HashMap::new();
    for assignment in assignments {
        let member = members.get(&assignment.member_id).cloned();
        let rank = match &member {
            Some(member) => {
                let rank = ranks.get(&member.rank_id).cloned();
                if rank.is_none() {
                    tracing::warn!(member_id = %member.uuid, "Member rank could not be resolved");
                }
                rank
            }
            None => {
                tracing::warn!(
                    job_row = assignment.job_id,
                    member_row = assignment.member_id,
                    "Assignment references a missing member"
                );
                None
            }
        };
        rosters
            .entry(assignment.job_id)
            .or_default()
            .push(Resolved {
                assignment,
                member,
                rank,
            });
    }

    for roster in rosters.values_mut() {
        roster.sort_by(roster_order);
    }
    rosters
}

async fn resolve<C: ConnectionTrait>(
    db: &C,
    job_rows: &[i64],
) -> Result<HashMap<i64, Vec<Resolved>>, DbErr> {
    if job_rows.is_empty() {
        return Ok(HashMap::new());
    }

    let assignments = job_member::Entity::find()
        .filter(job_member::Column::JobId.is_in(job_rows.iter().copied()))
        .all(db)
        .await?;

    let member_rows: BTreeSet<i64> = assignments.iter().map(|a| a.member_id).collect();
    let members: HashMap<i64, member::Model> = member::Entity::find()
        .filter(member::Column::Id.is_in(member_rows))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let rank_rows: BTreeSet<i64> = members.values().map(|m| m.rank_id).collect();
    let ranks: HashMap<i64, rank::Model> = rank::Entity::find()
        .filter(rank::Column::Id.is_in(rank_rows))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    Ok(assemble(assignments, &members, &ranks))
}

impl JobMember {
    /// `None` for an assignment without a member row; those only take part in
    /// payout calculation.
    fn from_resolved(resolved: Resolved) -> Option<Self> {
        let member = resolved.member?;
        Some(Self {
            member_id: member.uuid,
            member_name: member.name,
            member_rank_name: resolved.assignment.member_rank_name,
            member_rank_position: resolved.rank.map(|rank| rank.position),
            member_pay: resolved.assignment.member_pay,
        })
    }

    /// Rosters keyed by job row id, each ordered by rank position then name.
    pub async fn load_rosters<C: ConnectionTrait>(
        db: &C,
        job_rows: &[i64],
    ) -> Result<HashMap<i64, Vec<Self>>, DbErr> {
        Ok(resolve(db, job_rows)
            .await?
            .into_iter()
            .map(|(job_row, roster)| {
                (
                    job_row,
                    roster.into_iter().filter_map(Self::from_resolved).collect(),
                )
            })
            .collect())
    }

    pub async fn load_roster<C: ConnectionTrait>(
        db: &C,
        job_row: i64,
    ) -> Result<Vec<Self>, DbErr> {
        Ok(Self::load_rosters(db, &[job_row])
            .await?
            .remove(&job_row)
            .unwrap_or_default())
    }

    /// The payout view of a roster, in the same order as [`Self::load_roster`].
    pub async fn load_payout_roster<C: ConnectionTrait>(
        db: &C,
        job_row: i64,
    ) -> Result<Vec<RosterEntry>, DbErr> {
        Ok(resolve(db, &[job_row])
            .await?
            .remove(&job_row)
            .unwrap_or_default()
            .into_iter()
            .map(Resolved::into_payout_entry)
            .collect())
    }

    pub async fn member_rows<C: ConnectionTrait>(
        db: &C,
        job_row: i64,
    ) -> Result<BTreeSet<i64>, DbErr> {
        Ok(job_member::Entity::find()
            .filter(job_member::Column::JobId.eq(job_row))
            .all(db)
            .await?
            .into_iter()
            .map(|assignment| assignment.member_id)
            .collect())
    }

    pub async fn assign<C: ConnectionTrait>(
        db: &C,
        job_row: i64,
        member_row: i64,
        rank_name: &str,
    ) -> Result<(), DbErr> {
        let active = job_member::ActiveModel {
            job_id: Set(job_row),
            member_id: Set(member_row),
            member_rank_name: Set(rank_name.to_string()),
            member_pay: Set(None),
            ..Default::default()
        };
        active.insert(db).await?;
        Ok(())
    }

    pub async fn unassign<C: ConnectionTrait>(
        db: &C,
        job_row: i64,
        member_row: i64,
    ) -> Result<u64, DbErr> {
        let result = job_member::Entity::delete_many()
            .filter(job_member::Column::JobId.eq(job_row))
            .filter(job_member::Column::MemberId.eq(member_row))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn set_pay<C: ConnectionTrait>(
        db: &C,
        assignment_id: i64,
        member_pay: i64,
    ) -> Result<(), DbErr> {
        job_member::Entity::update_many()
            .col_expr(job_member::Column::MemberPay, Expr::value(member_pay))
            .filter(job_member::Column::Id.eq(assignment_id))
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn clear_pay<C: ConnectionTrait>(db: &C, job_row: i64) -> Result<(), DbErr> {
        job_member::Entity::update_many()
            .col_expr(job_member::Column::MemberPay, Expr::value(None::<i64>))
            .filter(job_member::Column::JobId.eq(job_row))
            .exec(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(id: i64, member_id: i64) -> job_member::Model {
        job_member::Model {
            id,
            job_id: 1,
            member_id,
            member_rank_name: "Officer".to_string(),
            member_pay: None,
        }
    }

    fn member(id: i64, name: &str, rank_id: i64) -> member::Model {
        member::Model {
            id,
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            rank_id,
            status: true,
        }
    }

    fn rank(id: i64, position: i32, share: f64) -> rank::Model {
        rank::Model {
            id,
            uuid: Uuid::new_v4(),
            name: format!("rank-{position}"),
            position,
            share,
        }
    }

    #[test]
    fn orders_by_live_position_then_name() {
        let members = HashMap::from([
            (1, member(1, "Charlie", 20)),
            (2, member(2, "Bravo", 10)),
            (3, member(3, "Alpha", 10)),
        ]);
        let ranks = HashMap::from([(10, rank(10, 1, 1.0)), (20, rank(20, 2, 0.75))]);

        let mut rosters = assemble(
            vec![assignment(1, 1), assignment(2, 2), assignment(3, 3)],
            &members,
            &ranks,
        );
        let names: Vec<String> = rosters
            .remove(&1)
            .unwrap()
            .into_iter()
            .filter_map(JobMember::from_resolved)
            .map(|m| m.member_name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Bravo", "Charlie"]);
    }

    #[test]
    fn assignment_without_member_stays_on_the_payout_roster() {
        let members = HashMap::from([(1, member(1, "Alpha", 10))]);
        let ranks = HashMap::from([(10, rank(10, 1, 1.0))]);

        let roster = assemble(vec![assignment(7, 99), assignment(8, 1)], &members, &ranks)
            .remove(&1)
            .unwrap();
        let entries: Vec<RosterEntry> =
            roster.into_iter().map(Resolved::into_payout_entry).collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].assignment_id, 8);
        assert_eq!(entries[0].share, Some(1.0));
        assert_eq!(
            entries[1],
            RosterEntry {
                assignment_id: 7,
                member_id: None,
                share: None,
            }
        );
    }

    #[test]
    fn job_view_omits_assignment_without_member() {
        let ranks = HashMap::from([(10, rank(10, 1, 1.0))]);
        let roster = assemble(vec![assignment(7, 99)], &HashMap::new(), &ranks)
            .remove(&1)
            .unwrap();
        assert!(roster.into_iter().filter_map(JobMember::from_resolved).next().is_none());
    }
}
